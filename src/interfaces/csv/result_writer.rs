use crate::domain::slot::ResultSlot;
use crate::error::Result;
use serde::Serialize;
use std::io::Write;

const HEADER: [&str; 7] = [
    "id",
    "status",
    "isEligible",
    "baseAmount",
    "childrenAmount",
    "supplementAmount",
    "reason",
];

#[derive(Serialize)]
struct ResultRow<'a> {
    id: &'a str,
    status: &'static str,
    is_eligible: Option<bool>,
    base_amount: Option<String>,
    children_amount: Option<String>,
    supplement_amount: Option<String>,
    reason: Option<&'a str>,
}

/// Writes one CSV row per correlation key.
///
/// Amounts are written normalized (`60`, not `60.0`). Pending and failed
/// slots leave the amount columns empty.
pub struct ResultWriter<W: Write> {
    writer: csv::Writer<W>,
}

impl<W: Write> ResultWriter<W> {
    pub fn new(sink: W) -> Result<Self> {
        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(sink);
        writer.write_record(HEADER)?;
        Ok(Self { writer })
    }

    pub fn write_result(&mut self, id: &str, slot: &ResultSlot) -> Result<()> {
        let mut row = ResultRow {
            id,
            status: slot.status(),
            is_eligible: None,
            base_amount: None,
            children_amount: None,
            supplement_amount: None,
            reason: None,
        };
        match slot {
            ResultSlot::Pending => {}
            ResultSlot::Complete(result) => {
                row.is_eligible = Some(result.is_eligible);
                row.base_amount = Some(result.base_amount.to_string());
                row.children_amount = Some(result.children_amount.to_string());
                row.supplement_amount = Some(result.supplement_amount.to_string());
            }
            ResultSlot::Failed { reason } => row.reason = Some(reason),
        }
        self.writer.serialize(row)?;
        Ok(())
    }

    pub fn flush(&mut self) -> Result<()> {
        self.writer.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::household::CorrelationKey;
    use crate::domain::supplement::{Amount, SupplementResult};

    fn written(rows: &[(&str, ResultSlot)]) -> String {
        let mut buffer = Vec::new();
        {
            let mut writer = ResultWriter::new(&mut buffer).unwrap();
            for (id, slot) in rows {
                writer.write_result(id, slot).unwrap();
            }
            writer.flush().unwrap();
        }
        String::from_utf8(buffer).unwrap()
    }

    #[test]
    fn test_header_only() {
        assert_eq!(
            written(&[]),
            "id,status,isEligible,baseAmount,childrenAmount,supplementAmount,reason\n"
        );
    }

    #[test]
    fn test_rows_per_state() {
        let complete = ResultSlot::Complete(SupplementResult::eligible(
            CorrelationKey::parse("t2").unwrap(),
            Amount::whole(120),
            Amount::whole(60),
        ));
        let failed = ResultSlot::Failed {
            reason: "Invalid numberOfChildren".to_string(),
        };

        let output = written(&[
            ("t2", complete),
            ("t5", failed),
            ("t9", ResultSlot::Pending),
        ]);
        let lines: Vec<&str> = output.lines().collect();
        assert_eq!(lines[1], "t2,complete,true,120,60,180,");
        assert_eq!(lines[2], "t5,failed,,,,,Invalid numberOfChildren");
        assert_eq!(lines[3], "t9,pending,,,,,");
    }
}
