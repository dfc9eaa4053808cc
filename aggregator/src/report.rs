use crate::parser::SEMICOLON;
use crate::reader::NEWLINE;
use crate::table::{Aggregate, StationTable};
use crate::value::MAX_ENCODED_LEN;

/// Appends `key;min;mean;max` without a line terminator.
pub fn write_line(out: &mut Vec<u8>, key: &[u8], agg: &Aggregate) {
    out.extend_from_slice(key);
    out.push(SEMICOLON);
    agg.min().encode_into(out);
    out.push(SEMICOLON);
    agg.mean().encode_into(out);
    out.push(SEMICOLON);
    agg.max().encode_into(out);
}

/// Renders the whole table, keys in ascending byte order, lines joined by
/// `\n` with no newline after the last one.
///
/// Keys are raw bytes, so the report is too; it is valid UTF-8 whenever the
/// input keys were.
pub fn generate(table: &StationTable) -> Vec<u8> {
    let mut rows: Vec<(&[u8], &Aggregate)> = table.iter().collect();
    rows.sort_unstable_by(|a, b| a.0.cmp(b.0));

    // each line has <key;value;value;value\n>
    let per_line = 3 * (1 + MAX_ENCODED_LEN) + 1;
    let size = rows.iter().map(|(k, _)| k.len() + per_line).sum();
    let mut out = Vec::with_capacity(size);
    for (i, (key, agg)) in rows.into_iter().enumerate() {
        if i > 0 {
            out.push(NEWLINE);
        }
        write_line(&mut out, key, agg);
    }
    out
}
