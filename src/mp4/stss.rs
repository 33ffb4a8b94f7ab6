use super::r#box::find_box;

/// Parse stss (sync samples) box (optional). Sample numbers are 1-based.
pub fn parse_stss(stbl: &[u8]) -> Option<Vec<u32>> {
    let stss = find_box(stbl, "stss")?;

    if stss.len() < 8 {
        return None;
    }

    let entry_count = u32::from_be_bytes([stss[4], stss[5], stss[6], stss[7]]) as usize;
    let end = (8 + entry_count * 4).min(stss.len());

    Some(
        stss[8..end]
            .chunks_exact(4)
            .map(|b| u32::from_be_bytes([b[0], b[1], b[2], b[3]]))
            .collect(),
    )
}
