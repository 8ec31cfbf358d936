use std::fs::File;
use std::io::{self, Read};
use std::path::Path;

use bundle_types::{BundleId, ContentHash};
use sha2::{Digest, Sha256};
use tracing::trace;

use crate::error::{ChecksumError, ChecksumResult};

/// Read buffer size for streaming hashes (64 KiB).
pub const BUFFER_SIZE: usize = 64 * 1024;

/// Hash everything a reader yields, in constant memory.
pub fn hash_reader<R: Read>(mut reader: R) -> io::Result<ContentHash> {
    let mut hasher = Sha256::new();
    let mut buf = vec![0u8; BUFFER_SIZE];

    loop {
        let n = match reader.read(&mut buf) {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        };
        hasher.update(&buf[..n]);
    }

    Ok(ContentHash::from_digest(hasher.finalize().into()))
}

/// Hash an in-memory byte slice.
pub fn hash_bytes(data: &[u8]) -> ContentHash {
    ContentHash::from_digest(Sha256::digest(data).into())
}

/// Stream a file through SHA-256.
///
/// File size never causes a failure; only open and read errors do, and
/// both carry the offending path.
pub fn hash_file(path: &Path) -> ChecksumResult<ContentHash> {
    let file = File::open(path).map_err(|e| ChecksumError::io("open", path, e))?;
    let hash = hash_reader(file).map_err(|e| ChecksumError::io("read", path, e))?;
    trace!(path = %path.display(), hash = %hash.short_hex(), "hashed file");
    Ok(hash)
}

/// Compute a bundle identity from a multiset of file hashes.
///
/// The hashes are sorted as lowercase hex strings by raw byte comparison,
/// joined with `\n` (no trailing separator) and the joined bytes are hashed.
/// Input order and platform locale never affect the result. An empty input
/// yields the SHA-256 of the empty string.
pub fn aggregate<'a, I>(hashes: I) -> BundleId
where
    I: IntoIterator<Item = &'a ContentHash>,
{
    let mut sorted: Vec<String> = hashes.into_iter().map(ContentHash::to_hex).collect();
    sorted.sort_unstable_by(|a, b| a.as_bytes().cmp(b.as_bytes()));

    let mut hasher = Sha256::new();
    for (i, hex) in sorted.iter().enumerate() {
        if i > 0 {
            hasher.update(b"\n");
        }
        hasher.update(hex.as_bytes());
    }
    BundleId::from_digest(hasher.finalize().into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::io::Write;

    const EMPTY: &str = "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855";
    const HELLO: &str = "2cf24dba5fb0a30e26e83b2ac5b9e29e1b161e5c1fa7425e73043362938b9824";
    const WORLD: &str = "486ea46224d1bb4fb680f34f7c9ad96a8f24ec88be73ea8e5a6c65260e9cb8a7";

    /// Reader that returns one byte per call and interrupts every other call.
    struct Trickle<'a> {
        data: &'a [u8],
        interrupt: bool,
    }

    impl Read for Trickle<'_> {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            self.interrupt = !self.interrupt;
            if self.interrupt {
                return Err(io::Error::from(io::ErrorKind::Interrupted));
            }
            if self.data.is_empty() || buf.is_empty() {
                return Ok(0);
            }
            buf[0] = self.data[0];
            self.data = &self.data[1..];
            Ok(1)
        }
    }

    #[test]
    fn known_vectors() {
        assert_eq!(hash_bytes(b"").to_hex(), EMPTY);
        assert_eq!(hash_bytes(b"hello").to_hex(), HELLO);
        assert_eq!(hash_bytes(b"world").to_hex(), WORLD);
    }

    #[test]
    fn reader_matches_bytes() {
        let data = vec![0xABu8; BUFFER_SIZE * 3 + 17];
        let streamed = hash_reader(&data[..]).unwrap();
        assert_eq!(streamed, hash_bytes(&data));
    }

    #[test]
    fn reader_retries_interrupted_reads() {
        let reader = Trickle {
            data: b"hello",
            interrupt: false,
        };
        assert_eq!(hash_reader(reader).unwrap().to_hex(), HELLO);
    }

    #[test]
    fn hash_file_streams_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("hello.txt");
        let mut file = File::create(&path).unwrap();
        file.write_all(b"hello").unwrap();
        drop(file);

        assert_eq!(hash_file(&path).unwrap().to_hex(), HELLO);
    }

    #[test]
    fn hash_file_missing_reports_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing.bin");
        let err = hash_file(&path).unwrap_err();
        match &err {
            ChecksumError::Io { op, path: p, .. } => {
                assert_eq!(*op, "open");
                assert_eq!(p, &path);
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert!(err.to_string().contains("missing.bin"));
    }

    #[test]
    fn aggregate_empty_is_hash_of_empty_string() {
        let none: [ContentHash; 0] = [];
        assert_eq!(aggregate(&none).to_hex(), EMPTY);
    }

    #[test]
    fn aggregate_single_is_hash_of_its_hex() {
        let h = hash_bytes(b"hello");
        let expected = Sha256::digest(HELLO.as_bytes());
        assert_eq!(aggregate([&h]).as_bytes(), expected.as_slice());
    }

    #[test]
    fn aggregate_joins_with_newline_without_trailer() {
        let a = hash_bytes(b"hello");
        let b = hash_bytes(b"world");
        // "2cf2..." sorts before "486e...".
        let joined = format!("{HELLO}\n{WORLD}");
        let expected = Sha256::digest(joined.as_bytes());
        assert_eq!(aggregate([&b, &a]).as_bytes(), expected.as_slice());
    }

    #[test]
    fn aggregate_keeps_duplicates() {
        let a = hash_bytes(b"same");
        assert_ne!(aggregate([&a]), aggregate([&a, &a]));
    }

    #[test]
    fn aggregate_is_sensitive_to_content() {
        let a = hash_bytes(b"hello");
        let b = hash_bytes(b"world");
        let c = hash_bytes(b"HELLO");
        assert_ne!(aggregate([&a, &b]), aggregate([&c, &b]));
    }

    fn hashes(n: usize) -> Vec<ContentHash> {
        (0..n).map(|i| hash_bytes(format!("file-{i}").as_bytes())).collect()
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(128))]

        #[test]
        fn aggregate_is_order_independent(shuffled in Just(hashes(24)).prop_shuffle()) {
            let baseline = aggregate(&hashes(24));
            prop_assert_eq!(aggregate(&shuffled), baseline);
        }

        #[test]
        fn aggregate_is_order_independent_for_arbitrary_content(
            contents in proptest::collection::vec(
                proptest::collection::vec(any::<u8>(), 0..64),
                0..16,
            ),
            seed in any::<u64>(),
        ) {
            let forward: Vec<ContentHash> = contents.iter().map(|c| hash_bytes(c)).collect();
            let mut rotated = forward.clone();
            if !rotated.is_empty() {
                let k = (seed as usize) % rotated.len();
                rotated.rotate_left(k);
            }
            rotated.reverse();
            prop_assert_eq!(aggregate(&forward), aggregate(&rotated));
        }
    }
}
