use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Origin of a sample row within an editing session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Provenance {
    /// Local file, not yet on the server.
    NewUpload,
    /// Picked from the personal library, not part of the pack when editing began.
    LibraryAddition,
    /// Part of the pack when editing began.
    PackOriginal,
}

/// The flag encoding of a row, as found in drafts and older clients.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SampleFlags {
    pub from_library: bool,
    pub already_in_pack: bool,
    pub has_remote_id: bool,
    pub has_source_file: bool,
}

/// Flag combinations that do not describe any valid row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum InvalidRow {
    #[error("row carries both a pending file and a remote id")]
    AmbiguousSource,

    #[error("row carries neither a pending file nor a remote id")]
    MissingSource,

    #[error("library row carries a pending file instead of a remote id")]
    LibraryRowWithPendingFile,

    #[error("row is marked as already in the pack but has no remote id")]
    PackRowWithoutRemoteId,

    #[error("remote row is not marked as coming from the library")]
    RemoteRowOutsideLibrary,

    #[error("row is marked as already in the pack, but the pack does not exist yet")]
    PackRowInNewPack,
}

/// Classifies a row from its flags.
///
/// Pure and total over all sixteen flag combinations: every combination maps to
/// exactly one [`Provenance`] or to an [`InvalidRow`] reason. An `Err` is a data
/// integrity defect, never a recoverable condition.
pub fn classify(flags: &SampleFlags) -> Result<Provenance, InvalidRow> {
    let SampleFlags {
        from_library,
        already_in_pack,
        has_remote_id,
        has_source_file,
    } = *flags;

    if already_in_pack && !has_remote_id {
        return Err(InvalidRow::PackRowWithoutRemoteId);
    }
    if has_source_file && has_remote_id {
        return Err(InvalidRow::AmbiguousSource);
    }
    if from_library && has_source_file {
        return Err(InvalidRow::LibraryRowWithPendingFile);
    }

    match (from_library, already_in_pack, has_remote_id, has_source_file) {
        (false, false, false, true) => Ok(Provenance::NewUpload),
        (true, false, true, false) => Ok(Provenance::LibraryAddition),
        (true, true, true, false) => Ok(Provenance::PackOriginal),
        (false, _, true, _) => Err(InvalidRow::RemoteRowOutsideLibrary),
        _ => Err(InvalidRow::MissingSource),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn flags(
        from_library: bool,
        already_in_pack: bool,
        has_remote_id: bool,
        has_source_file: bool,
    ) -> SampleFlags {
        SampleFlags {
            from_library,
            already_in_pack,
            has_remote_id,
            has_source_file,
        }
    }

    #[test]
    fn valid_rows() {
        assert_eq!(classify(&flags(false, false, false, true)), Ok(Provenance::NewUpload));
        assert_eq!(classify(&flags(true, false, true, false)), Ok(Provenance::LibraryAddition));
        assert_eq!(classify(&flags(true, true, true, false)), Ok(Provenance::PackOriginal));
    }

    #[test]
    fn library_row_with_pending_file_is_invalid() {
        assert_eq!(
            classify(&flags(true, false, false, true)),
            Err(InvalidRow::LibraryRowWithPendingFile)
        );
    }

    #[test]
    fn pack_row_without_remote_id_is_invalid() {
        assert_eq!(
            classify(&flags(true, true, false, false)),
            Err(InvalidRow::PackRowWithoutRemoteId)
        );
        assert_eq!(
            classify(&flags(false, true, false, true)),
            Err(InvalidRow::PackRowWithoutRemoteId)
        );
    }

    #[test]
    fn every_combination_is_classified() {
        let mut valid = 0;
        for bits in 0u8..16 {
            let f = flags(bits & 1 != 0, bits & 2 != 0, bits & 4 != 0, bits & 8 != 0);
            if classify(&f).is_ok() {
                valid += 1;
            }
            // Valid rows must satisfy the model invariants.
            if let Ok(p) = classify(&f) {
                assert!(f.has_remote_id != f.has_source_file, "{:?} -> {:?}", f, p);
                assert!(!f.already_in_pack || f.from_library, "{:?} -> {:?}", f, p);
            }
        }
        assert_eq!(valid, 3);
    }
}
