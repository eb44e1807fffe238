use crate::errors::{
    FragSeekError,
    Result,
};
use crate::models::Protein;
use std::path::Path;
use tracing::{
    info,
    warn,
};

/// Reads every protein of a FASTA file.
pub fn read_fasta(path: impl AsRef<Path>) -> Result<Vec<Protein>> {
    let path = path.as_ref();
    let contents = std::fs::read_to_string(path).map_err(|e| FragSeekError::io(e, path))?;
    let proteins = parse_fasta(&contents)?;
    info!("Read {} proteins from {}", proteins.len(), path.display());
    Ok(proteins)
}

/// Parses FASTA text.
///
/// The accession is the first whitespace-delimited token of the header and
/// the rest of the header is kept as the description. Entries without
/// sequence are skipped.
///
/// ```
/// use fragseek::data_sources::parse_fasta;
///
/// let proteins = parse_fasta(">sp|P1| First\nPEPT\nIDEK\n>P2\nAAK\n").unwrap();
/// assert_eq!(proteins.len(), 2);
/// assert_eq!(proteins[0].accession, "sp|P1|");
/// assert_eq!(proteins[0].description, "First");
/// assert_eq!(proteins[0].sequence.as_ref(), "PEPTIDEK");
/// ```
pub fn parse_fasta(contents: &str) -> Result<Vec<Protein>> {
    let mut proteins = Vec::new();
    let mut header: Option<&str> = None;
    let mut sequence = String::new();

    for (line_no, line) in contents.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() || line.starts_with(';') {
            continue;
        }
        if let Some(rest) = line.strip_prefix('>') {
            if let Some(h) = header.take() {
                push_entry(&mut proteins, h, &sequence);
            }
            header = Some(rest);
            sequence.clear();
            continue;
        }
        if header.is_none() {
            return Err(FragSeekError::Parse {
                msg: format!("FASTA line {} has sequence before any header", line_no + 1),
            });
        }
        sequence.extend(line.chars().filter(|c| !c.is_whitespace() && *c != '*'));
    }
    if let Some(h) = header {
        push_entry(&mut proteins, h, &sequence);
    }
    Ok(proteins)
}

fn push_entry(proteins: &mut Vec<Protein>, header: &str, sequence: &str) {
    let header = header.trim();
    let (accession, description) = match header.split_once(char::is_whitespace) {
        Some((acc, desc)) => (acc, desc.trim()),
        None => (header, ""),
    };
    if sequence.is_empty() {
        warn!("Skipping FASTA entry {:?} without sequence", accession);
        return;
    }
    proteins.push(Protein::new(accession, sequence).with_description(description));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_multiline_and_empty_entries() {
        let text = "\n>A desc one\nmkwv\nTFIS\n>EMPTY\n>B\nPEPTIDE*\n";
        let proteins = parse_fasta(text).unwrap();
        let accessions: Vec<&str> = proteins.iter().map(|p| p.accession.as_str()).collect();
        assert_eq!(accessions, vec!["A", "B"]);
        assert_eq!(proteins[0].sequence.as_ref(), "MKWVTFIS");
        assert_eq!(proteins[1].sequence.as_ref(), "PEPTIDE");
        assert_eq!(proteins[1].description, "");
    }

    #[test]
    fn test_sequence_before_header() {
        assert!(matches!(
            parse_fasta("PEPTIDE\n>A\nK\n"),
            Err(FragSeekError::Parse { .. })
        ));
    }

    #[test]
    fn test_missing_file() {
        assert!(matches!(
            read_fasta("/definitely/not/here.fasta"),
            Err(FragSeekError::Io { .. })
        ));
    }
}
