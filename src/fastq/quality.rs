/// Decode raw quality characters into Phred scores.
///
/// No clamping is applied: characters below the offset give negative scores.
pub fn parse_scores(qual: &[u8], offset: i32) -> Vec<i32> {
    qual.iter().map(|&q| q as i32 - offset).collect()
}
