//! Record flattening
//!
//! Walks one parsed invoice document and produces the denormalized rows:
//! header → delivery point → amount, with the header fields repeated on
//! every row.

use roxmltree::{Document, Node, ParsingOptions};

use crate::config::TagNames;
use crate::record::{Amount, DeliveryPoint, DocumentContext, FlatRecord};

/// First child element of `parent` with the given local name
pub fn child<'a, 'input>(parent: Option<Node<'a, 'input>>, tag: &str) -> Option<Node<'a, 'input>> {
    parent?
        .children()
        .find(|n| n.is_element() && n.tag_name().name() == tag)
}

/// Text of the `tag` child of `parent`, or an empty string when either is missing
pub fn child_text(parent: Option<Node<'_, '_>>, tag: &str) -> String {
    child(parent, tag)
        .and_then(|n| n.text())
        .unwrap_or_default()
        .to_string()
}

/// All child elements of `parent` with the given local name, in document order
fn children<'a, 'input>(
    parent: Node<'a, 'input>,
    tag: &'a str,
) -> impl Iterator<Item = Node<'a, 'input>> + 'a {
    parent
        .children()
        .filter(move |n| n.is_element() && n.tag_name().name() == tag)
}

/// Parse XML text into a document tree
pub fn parse_document(text: &str) -> Result<Document<'_>, roxmltree::Error> {
    let options = ParsingOptions {
        allow_dtd: true,
        ..ParsingOptions::default()
    };
    Document::parse_with_options(text, options)
}

/// Flatten a parsed document into rows.
///
/// One row when the delivery point list is missing; otherwise one row per
/// amount, or a single row for a delivery point without amounts.
pub fn flatten_document(doc: &Document<'_>, file_name: &str, tags: &TagNames) -> Vec<FlatRecord> {
    let root = Some(doc.root_element());

    let header = child(root, &tags.header);
    let sender = child(root, &tags.sender);
    let invoice = child(root, &tags.invoice);

    let context = DocumentContext {
        file_name: file_name.to_string(),
        creation_date: child_text(header, &tags.creation_date),
        sequence_number: child_text(header, &tags.sequence_number),
        sender_name: child_text(sender, &tags.legal_name),
        sender_vat: child_text(sender, &tags.vat_number),
        invoice_number: child_text(invoice, &tags.invoice_number),
        issue_date: child_text(invoice, &tags.issue_date),
    };

    let Some(points) = child(root, &tags.delivery_points) else {
        return vec![FlatRecord::new(
            context,
            DeliveryPoint::default(),
            Amount::default(),
        )];
    };

    let mut rows = Vec::new();
    for point_node in children(points, &tags.delivery_point) {
        let point = DeliveryPoint {
            pdr_code: child_text(Some(point_node), &tags.pdr_code),
            remi_pool: child_text(Some(point_node), &tags.remi_pool),
        };

        // An empty amount list collapses to the same single row as a missing one
        let amounts: Vec<Amount> = child(Some(point_node), &tags.amounts)
            .map(|list| {
                children(list, &tags.amount)
                    .map(|n| read_amount(n, tags))
                    .collect()
            })
            .unwrap_or_default();

        if amounts.is_empty() {
            rows.push(FlatRecord::new(context.clone(), point, Amount::default()));
        } else {
            for amount in amounts {
                rows.push(FlatRecord::new(context.clone(), point.clone(), amount));
            }
        }
    }

    rows
}

fn read_amount(node: Node<'_, '_>, tags: &TagNames) -> Amount {
    let node = Some(node);
    Amount {
        period_start: child_text(node, &tags.period_start),
        period_end: child_text(node, &tags.period_end),
        movement_type: child_text(node, &tags.movement_type),
        tariff_component: child_text(node, &tags.tariff_component),
        quota: child_text(node, &tags.quota),
        tier: child_text(node, &tags.tier),
        quantity: child_text(node, &tags.quantity),
        taxable: child_text(node, &tags.taxable),
    }
}

/// Parse and flatten in one step
pub fn flatten_str(
    text: &str,
    file_name: &str,
    tags: &TagNames,
) -> Result<Vec<FlatRecord>, roxmltree::Error> {
    let doc = parse_document(text)?;
    Ok(flatten_document(&doc, file_name, tags))
}
