//! Writers for the finalized event log.
//!
//! The tabular form is one row per event, header first, newline separated,
//! columns in a fixed order. No field can contain a comma, so no quoting is
//! applied. The JSON-lines form writes one camelCase object per line with
//! the same fields as the tabular columns, typed rather than flattened:
//!
//! | Field | Tabular | JSON lines |
//! |-------|---------|------------|
//! | `result` before settlement | empty cell | `null` |
//! | money (`accountBalance`, `entryFeePaid`, `winAmount`, `targetWinAmount`) | bare number, e.g. `-5` | decimal string, e.g. `"-5"` |
//! | ids, `score`, `rank` | bare number | JSON number |
//!
//! Money stays a string in JSON so the exact decimal survives a reader that
//! parses numbers as floats.

use std::io::{self, Write};

use contest_types::ContestEvent;

/// Column header of the tabular export.
pub const CSV_HEADER: &str = "transactionId,gameId,contestId,entryType,participantId,eventType,timestamp,accountBalance,entryFeePaid,winAmount,targetWinAmount,score,rank,result";

/// Errors that can occur while writing an export.
#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    /// The destination could not be written.
    #[error("failed to write export: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: io::Error,
    },

    /// An event could not be serialized.
    #[error("failed to serialize event: {source}")]
    Json {
        /// The underlying serialization error.
        #[from]
        source: serde_json::Error,
    },
}

/// Render one event as a tabular row (no trailing newline).
pub fn csv_row(event: &ContestEvent) -> String {
    let result = event.result.map_or("", |r| r.as_str());
    format!(
        "{},{},{},{},{},{},{},{},{},{},{},{},{},{}",
        event.transaction_id,
        event.game_id,
        event.contest_id,
        event.entry_type,
        event.participant_id,
        event.event_type,
        event.timestamp,
        event.account_balance,
        event.entry_fee_paid,
        event.win_amount,
        event.target_win_amount,
        event.score,
        event.rank,
        result,
    )
}

/// Render the whole log as a tabular document: header, then one row per
/// event, joined by newlines with no trailing newline.
pub fn to_csv_string(events: &[ContestEvent]) -> String {
    let mut out = String::from(CSV_HEADER);
    for event in events {
        out.push('\n');
        out.push_str(&csv_row(event));
    }
    out
}

/// Write the tabular document to `writer`.
///
/// # Errors
///
/// Returns [`ExportError::Io`] if the writer fails.
pub fn write_csv<W: Write>(events: &[ContestEvent], writer: &mut W) -> Result<(), ExportError> {
    writer.write_all(to_csv_string(events).as_bytes())?;
    writer.flush()?;
    Ok(())
}

/// Write one JSON object per line to `writer`.
///
/// # Errors
///
/// Returns [`ExportError::Json`] if an event cannot be serialized or
/// [`ExportError::Io`] if the writer fails.
pub fn write_json_lines<W: Write>(
    events: &[ContestEvent],
    writer: &mut W,
) -> Result<(), ExportError> {
    for event in events {
        serde_json::to_writer(&mut *writer, event)?;
        writer.write_all(b"\n")?;
    }
    writer.flush()?;
    Ok(())
}
