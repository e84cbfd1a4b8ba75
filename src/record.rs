//! Flat output record
//!
//! One CSV row: document context, delivery point and amount, all 17 columns
//! always present.

use crate::error::{Result, Xml2CsvError};

/// Column names in output order
pub const COLUMNS: [&str; 17] = [
    "nome_file",
    "data_creazione",
    "numero_sequenza",
    "mittente_ragione_sociale",
    "mittente_partita_iva",
    "numero_fattura",
    "data_emissione",
    "codice_pdr",
    "remi_pool",
    "data_inizio",
    "data_fine",
    "tipo_movimento",
    "componente_tariffaria",
    "quota",
    "scaglione",
    "quantita",
    "imponibile",
];

/// Document level fields, repeated on every row of a document
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DocumentContext {
    pub file_name: String,
    pub creation_date: String,
    pub sequence_number: String,
    pub sender_name: String,
    pub sender_vat: String,
    pub invoice_number: String,
    pub issue_date: String,
}

/// Delivery point fields
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeliveryPoint {
    pub pdr_code: String,
    pub remi_pool: String,
}

/// Tariff component amount fields
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Amount {
    pub period_start: String,
    pub period_end: String,
    pub movement_type: String,
    pub tariff_component: String,
    pub quota: String,
    pub tier: String,
    pub quantity: String,
    pub taxable: String,
}

/// A denormalized output row
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FlatRecord {
    pub context: DocumentContext,
    pub point: DeliveryPoint,
    pub amount: Amount,
}

impl FlatRecord {
    pub fn new(context: DocumentContext, point: DeliveryPoint, amount: Amount) -> Self {
        Self {
            context,
            point,
            amount,
        }
    }

    /// Field values in `COLUMNS` order
    pub fn values(&self) -> [&str; 17] {
        let c = &self.context;
        let p = &self.point;
        let a = &self.amount;
        [
            c.file_name.as_str(),
            c.creation_date.as_str(),
            c.sequence_number.as_str(),
            c.sender_name.as_str(),
            c.sender_vat.as_str(),
            c.invoice_number.as_str(),
            c.issue_date.as_str(),
            p.pdr_code.as_str(),
            p.remi_pool.as_str(),
            a.period_start.as_str(),
            a.period_end.as_str(),
            a.movement_type.as_str(),
            a.tariff_component.as_str(),
            a.quota.as_str(),
            a.tier.as_str(),
            a.quantity.as_str(),
            a.taxable.as_str(),
        ]
    }

    /// Lowercased, space-joined field values used as the filter haystack
    pub fn search_text(&self) -> String {
        self.values().join(" ").to_lowercase()
    }

    /// Render as one delimited line (no terminator, no quoting)
    pub fn to_line(&self, delimiter: char) -> String {
        self.values().join(delimiter.to_string().as_str())
    }

    /// Fail if any value would break an unquoted row
    pub fn ensure_writable(&self, delimiter: char) -> Result<()> {
        for (column, value) in COLUMNS.into_iter().zip(self.values()) {
            if value.contains(|ch: char| ch == delimiter || ch == '\n' || ch == '\r') {
                return Err(Xml2CsvError::UnsafeField {
                    column,
                    value: value.to_string(),
                });
            }
        }
        Ok(())
    }
}

/// Header row for the given delimiter
pub fn header_line(delimiter: char) -> String {
    COLUMNS.join(delimiter.to_string().as_str())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> FlatRecord {
        FlatRecord::new(
            DocumentContext {
                file_name: "a.xml".into(),
                sender_name: "Gas Rete SpA".into(),
                ..Default::default()
            },
            DeliveryPoint {
                pdr_code: "00881234567890".into(),
                remi_pool: "34512300".into(),
            },
            Amount {
                tariff_component: "TAU1".into(),
                ..Default::default()
            },
        )
    }

    #[test]
    fn test_values_follow_column_order() {
        let record = sample();
        let values = record.values();
        assert_eq!(values.len(), COLUMNS.len());
        assert_eq!(values[0], "a.xml");
        assert_eq!(values[3], "Gas Rete SpA");
        assert_eq!(values[7], "00881234567890");
        assert_eq!(values[12], "TAU1");
        assert_eq!(values[16], "");
    }

    #[test]
    fn test_to_line() {
        let line = sample().to_line(';');
        assert_eq!(line.split(';').count(), 17);
        assert!(line.starts_with("a.xml;;;Gas Rete SpA;"));
    }

    #[test]
    fn test_header_line() {
        let header = header_line(';');
        assert!(header.starts_with("nome_file;data_creazione;"));
        assert!(header.ends_with(";quantita;imponibile"));
    }

    #[test]
    fn test_search_text_is_lowercase() {
        let text = sample().search_text();
        assert!(text.contains("gas rete spa"));
        assert!(text.contains("tau1"));
    }

    #[test]
    fn test_ensure_writable() {
        let record = sample();
        assert!(record.ensure_writable(';').is_ok());

        let mut bad = sample();
        bad.context.sender_name = "Gas; Rete".into();
        let err = bad.ensure_writable(';').unwrap_err();
        assert!(matches!(
            err,
            Xml2CsvError::UnsafeField {
                column: "mittente_ragione_sociale",
                ..
            }
        ));

        let mut multiline = sample();
        multiline.amount.quota = "a\nb".into();
        assert!(multiline.ensure_writable(';').is_err());
    }
}
