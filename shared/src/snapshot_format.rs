use bincode::{Decode, Encode};

pub const SNAPSHOT_FILE_MAGIC: [u8; 4] = *b"IPSN";
pub const SNAPSHOT_FILE_VERSION: u32 = 1;
const SNAPSHOT_HEADER_LEN: usize = SNAPSHOT_FILE_MAGIC.len() + std::mem::size_of::<u32>();

/// On-disk (or S3 object) form of one persisted drawing snapshot.
#[derive(Clone, Debug, Default, PartialEq, Encode, Decode, serde::Serialize, serde::Deserialize)]
pub struct SnapshotFileData {
    pub image: String,
}

#[derive(Debug, PartialEq, Eq)]
pub enum SnapshotFileDecodeError {
    UnsupportedVersion(u32),
    InvalidData,
}

pub fn encode_snapshot_file(data: &SnapshotFileData) -> Vec<u8> {
    let mut payload = Vec::new();
    payload.extend_from_slice(&SNAPSHOT_FILE_MAGIC);
    payload.extend_from_slice(&SNAPSHOT_FILE_VERSION.to_le_bytes());
    let body = bincode::encode_to_vec(data, bincode::config::standard()).unwrap_or_default();
    payload.extend_from_slice(&body);
    payload
}

pub fn decode_snapshot_file(payload: &[u8]) -> Result<SnapshotFileData, SnapshotFileDecodeError> {
    if !(payload.len() >= SNAPSHOT_HEADER_LEN && payload.starts_with(&SNAPSHOT_FILE_MAGIC)) {
        return Err(SnapshotFileDecodeError::InvalidData);
    }
    let version = u32::from_le_bytes(
        payload[SNAPSHOT_FILE_MAGIC.len()..SNAPSHOT_HEADER_LEN]
            .try_into()
            .map_err(|_| SnapshotFileDecodeError::InvalidData)?,
    );
    let body = &payload[SNAPSHOT_HEADER_LEN..];
    match version {
        1 => bincode::decode_from_slice(body, bincode::config::standard())
            .map(|(data, _)| data)
            .map_err(|_| SnapshotFileDecodeError::InvalidData),
        _ => Err(SnapshotFileDecodeError::UnsupportedVersion(version)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encoded_snapshot_decodes_back() {
        let data = SnapshotFileData {
            image: "data:image/png;base64,iVBORw0KGgo=".into(),
        };
        let payload = encode_snapshot_file(&data);
        assert!(payload.starts_with(&SNAPSHOT_FILE_MAGIC));
        let decoded = decode_snapshot_file(&payload).unwrap();
        assert_eq!(decoded.image, data.image);
    }

    #[test]
    fn truncated_payload_is_invalid() {
        assert_eq!(
            decode_snapshot_file(b"IP"),
            Err(SnapshotFileDecodeError::InvalidData)
        );
    }

    #[test]
    fn wrong_magic_is_invalid() {
        let mut payload = encode_snapshot_file(&SnapshotFileData::default());
        payload[0] = b'X';
        assert_eq!(
            decode_snapshot_file(&payload),
            Err(SnapshotFileDecodeError::InvalidData)
        );
    }

    #[test]
    fn future_version_is_rejected() {
        let mut payload = encode_snapshot_file(&SnapshotFileData::default());
        payload[4..8].copy_from_slice(&9u32.to_le_bytes());
        assert_eq!(
            decode_snapshot_file(&payload),
            Err(SnapshotFileDecodeError::UnsupportedVersion(9))
        );
    }
}
