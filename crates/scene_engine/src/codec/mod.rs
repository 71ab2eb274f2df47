//! Chunked binary scene format
//!
//! Scenes persist to a versioned, self-describing container that survives
//! round-tripping and tolerates chunk types it does not recognize.
//!
//! ## File structure
//! ```text
//! +--------------------------------------------------------------+
//! | Header (24 bytes): "GHCS", cohort, major, minor, endianness, |
//! |   total size, checksum, ToC offset (all three backpatched),  |
//! |   "ENDH"                                                     |
//! +--------------------------------------------------------------+
//! | Chunks: "GHCK", type, endianness, payload length, payload,   |
//! |   "ENDC" (each chunk may use its own endianness)             |
//! +--------------------------------------------------------------+
//! | Table of contents: "GHTC", chunk count, per chunk            |
//! |   (type, file offset, total size), "ENDT"                    |
//! +--------------------------------------------------------------+
//! ```
//!
//! The checksum is a plain order-sensitive accumulator over every byte after
//! the header; it detects corruption, not tampering. Mismatches in the
//! checksum or the recorded total size are reported as warnings since both
//! fields are diagnostic. Structural problems (bad magic, truncated chunks,
//! type mismatches against the table of contents) abort the load and leave
//! the live scene untouched.

pub mod buffer;
mod decode;
mod encode;

pub use decode::decode_scene;
pub use encode::encode_scene;

use std::path::Path;

use thiserror::Error;

use crate::scene::Scene;

/// File header magic
pub const FILE_MAGIC: [u8; 4] = *b"GHCS";
/// File header footer magic
pub const HEADER_FOOTER: [u8; 4] = *b"ENDH";
/// Chunk header magic
pub const CHUNK_MAGIC: [u8; 4] = *b"GHCK";
/// Chunk footer magic
pub const CHUNK_FOOTER: [u8; 4] = *b"ENDC";
/// Table-of-contents magic
pub const TOC_MAGIC: [u8; 4] = *b"GHTC";
/// Table-of-contents footer magic
pub const TOC_FOOTER: [u8; 4] = *b"ENDT";

/// Format cohort byte carried in the header
pub const FORMAT_COHORT: u8 = 34;
/// Major format version
pub const VERSION_MAJOR: u8 = 1;
/// Minor format version
pub const VERSION_MINOR: u8 = 1;

/// Fixed header size in bytes
pub const HEADER_SIZE: usize = 24;
/// Chunk header size: magic(4) + type(1) + endianness(1) + length(4)
pub const CHUNK_HEADER_SIZE: usize = 10;
/// Chunk footer size
pub const CHUNK_FOOTER_SIZE: usize = 4;
/// Total chunk overhead around the payload
pub const CHUNK_OVERHEAD: usize = CHUNK_HEADER_SIZE + CHUNK_FOOTER_SIZE;
/// Smallest valid file: header plus an empty table of contents
pub const MIN_FILE_SIZE: usize = HEADER_SIZE + 9;

/// Sentinel shape index marking an unresolved reference in tree chunks
pub const UNRESOLVED_SHAPE: u16 = u16::MAX;

/// Chunk type bytes
pub mod chunk_type {
    /// World bounds and shape count (mandatory)
    pub const SCENE_INFO: u8 = 0x01;
    /// Vertex loops, one per shape (mandatory)
    pub const CONVEX_POLYS: u8 = 0x02;
    /// Half-plane lists, one per shape
    pub const CONVEX_HULLS: u8 = 0x80;
    /// Bounding disc per shape
    pub const BOUNDING_DISCS: u8 = 0x81;
    /// Bounding box per shape
    pub const BOUNDING_BOXES: u8 = 0x82;
    /// Bounding-box tree nodes
    pub const BVH_TREE: u8 = 0x83;
    /// Region quadtree nodes
    pub const QUAD_TREE: u8 = 0x87;

    /// Whether this implementation parses the given chunk type
    pub fn is_known(value: u8) -> bool {
        matches!(
            value,
            SCENE_INFO | CONVEX_POLYS | CONVEX_HULLS | BOUNDING_DISCS | BOUNDING_BOXES | BVH_TREE | QUAD_TREE
        )
    }
}

/// Order-sensitive accumulator over every byte after the fixed header
pub fn content_hash(file_bytes: &[u8]) -> u32 {
    let body = file_bytes.get(HEADER_SIZE..).unwrap_or(&[]);
    body.iter()
        .fold(0u32, |hash, &byte| hash.wrapping_mul(31).wrapping_add(u32::from(byte)))
}

/// A chunk this implementation does not parse, kept for re-emission
///
/// The raw bytes cover the complete chunk (header, payload, and footer) so an
/// unmodified scene re-saves it untouched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownChunk {
    /// The chunk's type byte
    pub chunk_type: u8,
    /// The chunk's endianness byte, as stored
    pub endianness: u8,
    /// The complete chunk, byte for byte
    pub raw: Vec<u8>,
}

/// Errors produced by scene encoding and decoding
#[derive(Error, Debug)]
pub enum CodecError {
    /// Underlying file I/O failed
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The file exists but holds no bytes
    #[error("file is empty: {0}")]
    EmptyFile(String),

    /// The file is shorter than the smallest valid scene
    #[error("file too small ({0} bytes) to be a scene file")]
    TooSmall(usize),

    /// A magic tag did not match at the given offset
    #[error("bad {location} magic at offset {offset}")]
    BadMagic {
        /// Which structure the magic belongs to
        location: &'static str,
        /// Byte offset of the failed comparison
        offset: usize,
    },

    /// The header's endianness byte is neither little nor big
    #[error("unsupported endianness byte {0}")]
    UnsupportedEndianness(u8),

    /// A read ran past the end of the buffer
    #[error("unexpected end of buffer at offset {0}")]
    UnexpectedEof(usize),

    /// The table-of-contents offset points outside the file
    #[error("table of contents offset {offset} exceeds file size {len}")]
    TocOutOfRange {
        /// Recorded ToC offset
        offset: usize,
        /// Actual file size
        len: usize,
    },

    /// A ToC entry points at an offset that cannot hold a chunk
    #[error("chunk offset {0} exceeds the file bounds")]
    ChunkOutOfRange(usize),

    /// A chunk header's type byte disagrees with its ToC entry
    #[error("chunk type {header:#04x} disagrees with table-of-contents entry {toc:#04x}")]
    ChunkTypeMismatch {
        /// Type byte in the chunk header
        header: u8,
        /// Type byte in the ToC entry
        toc: u8,
    },

    /// A chunk's declared payload overruns the file
    #[error("chunk at offset {offset} declares {declared} payload bytes beyond the file end")]
    TruncatedChunk {
        /// File offset of the chunk
        offset: usize,
        /// Declared payload length
        declared: u32,
    },

    /// A chunk parser consumed a different number of bytes than declared
    #[error("chunk at offset {offset} consumed {consumed} bytes but declared {declared}")]
    PayloadSizeMismatch {
        /// File offset of the chunk
        offset: usize,
        /// Bytes actually consumed by the parser
        consumed: usize,
        /// Declared payload length
        declared: u32,
    },

    /// A chunk's on-disk extent disagrees with its ToC entry
    #[error("chunk at offset {0} does not match its table-of-contents size")]
    TocSizeMismatch(usize),

    /// A mandatory chunk type never appeared
    #[error("missing mandatory {0} chunk")]
    MissingChunk(&'static str),

    /// Scene-info and polygon chunks disagree about the shape count
    #[error("shape count disagrees between scene info and polygon chunks")]
    ShapeCountMismatch,
}

/// Serialize a scene and write it to a file
///
/// Parent directories are created as needed.
pub fn save_scene<P: AsRef<Path>>(scene: &Scene, path: P) -> Result<(), CodecError> {
    let path = path.as_ref();
    let bytes = encode_scene(scene);
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    std::fs::write(path, &bytes)?;
    log::info!("saved scene ({} bytes) to {}", bytes.len(), path.display());
    Ok(())
}

/// Read and decode a scene file
pub fn load_scene<P: AsRef<Path>>(path: P) -> Result<Scene, CodecError> {
    let path = path.as_ref();
    let bytes = std::fs::read(path)?;
    if bytes.is_empty() {
        return Err(CodecError::EmptyFile(path.display().to_string()));
    }
    let scene = decode_scene(&bytes)?;
    log::info!(
        "loaded scene with {} shapes from {}",
        scene.shape_count(),
        path.display()
    );
    Ok(scene)
}

#[cfg(test)]
mod tests {
    use super::buffer::{ByteWriter, Endianness};
    use super::*;
    use crate::foundation::math::Vec2;
    use crate::geometry::{Aabb2, ConvexShape};
    use crate::scene::generator;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn world() -> Aabb2 {
        Aabb2::new(Vec2::new(0.0, 0.0), Vec2::new(200.0, 100.0))
    }

    fn seeded_scene(seed: u64, shape_count: usize) -> Scene {
        let mut rng = StdRng::seed_from_u64(seed);
        let mut scene = generator::random_scene(&mut rng, world(), shape_count, 2.0, 6.0);
        scene.rebuild_accelerators();
        scene
    }

    /// A syntactically valid chunk of a type this codec does not parse
    fn foreign_chunk(payload: &[u8]) -> UnknownChunk {
        let mut writer = ByteWriter::new(Endianness::Big);
        writer.put_bytes(&CHUNK_MAGIC);
        writer.put_u8(0x55);
        writer.put_u8(Endianness::Big.to_byte());
        writer.put_u32(payload.len() as u32);
        writer.put_bytes(payload);
        writer.put_bytes(&CHUNK_FOOTER);
        UnknownChunk {
            chunk_type: 0x55,
            endianness: Endianness::Big.to_byte(),
            raw: writer.into_bytes(),
        }
    }

    #[test]
    fn test_round_trip_preserves_geometry_bit_for_bit() {
        let scene = seeded_scene(11, 24);
        let bytes = encode_scene(&scene);
        let decoded = decode_scene(&bytes).expect("round trip should decode");

        assert_eq!(decoded.shape_count(), scene.shape_count());
        for (original, loaded) in scene.shapes().iter().zip(decoded.shapes()) {
            for (a, b) in original.polygon().vertices().iter().zip(loaded.polygon().vertices()) {
                assert_eq!(a.x.to_bits(), b.x.to_bits());
                assert_eq!(a.y.to_bits(), b.y.to_bits());
            }
            for (a, b) in original.hull().planes().iter().zip(loaded.hull().planes()) {
                assert_eq!(a.normal.x.to_bits(), b.normal.x.to_bits());
                assert_eq!(a.normal.y.to_bits(), b.normal.y.to_bits());
                assert_eq!(a.distance.to_bits(), b.distance.to_bits());
            }
            assert_eq!(
                original.bounding_disc().radius.to_bits(),
                loaded.bounding_disc().radius.to_bits()
            );
            assert_eq!(original.bounding_box(), loaded.bounding_box());
        }
    }

    #[test]
    fn test_round_trip_preserves_tree_layout() {
        let scene = seeded_scene(5, 40);
        let bytes = encode_scene(&scene);
        let decoded = decode_scene(&bytes).expect("round trip should decode");

        assert_eq!(decoded.bvh().nodes().len(), scene.bvh().nodes().len());
        assert_eq!(decoded.bvh().first_leaf(), scene.bvh().first_leaf());
        for (a, b) in scene.bvh().nodes().iter().zip(decoded.bvh().nodes()) {
            assert_eq!(a.shapes, b.shapes);
            assert_eq!(a.bounds, b.bounds);
        }

        assert_eq!(decoded.quadtree().nodes().len(), scene.quadtree().nodes().len());
        for (a, b) in scene.quadtree().nodes().iter().zip(decoded.quadtree().nodes()) {
            assert_eq!(a.shapes, b.shapes);
            assert_eq!(a.bounds, b.bounds);
        }
    }

    #[test]
    fn test_unmodified_resave_is_byte_identical() {
        let scene = seeded_scene(3, 16);
        let bytes = encode_scene(&scene);
        let decoded = decode_scene(&bytes).expect("decode");
        assert!(!decoded.is_modified());
        assert_eq!(encode_scene(&decoded), bytes);
    }

    #[test]
    fn test_unknown_chunk_passthrough_byte_identical() {
        let payload = b"custom-tool-annotations";
        let chunk = foreign_chunk(payload);

        // A decoded (hence unmodified) scene carrying a foreign chunk
        let source = seeded_scene(8, 6);
        let mut scene = decode_scene(&encode_scene(&source)).expect("decode");
        scene.set_preserved_chunks(vec![chunk.clone()]);

        let bytes = encode_scene(&scene);
        let reloaded = decode_scene(&bytes).expect("file with foreign chunk should decode");
        assert_eq!(reloaded.preserved_chunks().len(), 1);
        assert_eq!(reloaded.preserved_chunks()[0], chunk);

        // Saving the reloaded scene again reproduces the file exactly
        assert_eq!(encode_scene(&reloaded), bytes);
    }

    #[test]
    fn test_modified_scene_drops_unknown_chunks() {
        let payload = b"custom-tool-annotations";
        let source = seeded_scene(8, 6);
        let mut scene = decode_scene(&encode_scene(&source)).expect("decode");
        scene.set_preserved_chunks(vec![foreign_chunk(payload)]);

        scene.translate_shape(0, Vec2::new(1.0, 1.0));
        assert!(scene.is_modified());
        scene.rebuild_accelerators();

        let bytes = encode_scene(&scene);
        let reloaded = decode_scene(&bytes).expect("decode");
        assert!(reloaded.preserved_chunks().is_empty());
        assert!(
            !bytes.windows(payload.len()).any(|window| window == payload),
            "foreign payload should not survive a modified save"
        );
    }

    #[test]
    fn test_corrupted_checksum_loads_with_warning() {
        let scene = seeded_scene(2, 10);
        let mut bytes = encode_scene(&scene);
        for byte in &mut bytes[12..16] {
            *byte ^= 0xFF;
        }
        let decoded = decode_scene(&bytes).expect("checksum mismatch is only a warning");
        assert_eq!(decoded.shape_count(), scene.shape_count());
    }

    #[test]
    fn test_corrupted_size_field_loads_with_warning() {
        let scene = seeded_scene(2, 10);
        let mut bytes = encode_scene(&scene);
        bytes[8..12].copy_from_slice(&0xDEAD_BEEFu32.to_le_bytes());
        assert!(decode_scene(&bytes).is_ok());
    }

    #[test]
    fn test_truncated_chunk_fails() {
        let scene = seeded_scene(2, 10);
        let mut bytes = encode_scene(&scene);
        // First chunk sits right after the header; its payload length field
        // is the last four bytes of the chunk header
        let length_offset = HEADER_SIZE + 6;
        bytes[length_offset..length_offset + 4].copy_from_slice(&u32::MAX.to_le_bytes());
        assert!(matches!(
            decode_scene(&bytes),
            Err(CodecError::TruncatedChunk { .. })
        ));
    }

    #[test]
    fn test_truncated_file_fails() {
        let scene = seeded_scene(2, 10);
        let mut bytes = encode_scene(&scene);
        bytes.truncate(bytes.len() - 8);
        assert!(decode_scene(&bytes).is_err());
    }

    #[test]
    fn test_bad_file_magic_fails() {
        let scene = seeded_scene(2, 4);
        let mut bytes = encode_scene(&scene);
        bytes[0] = b'X';
        assert!(matches!(
            decode_scene(&bytes),
            Err(CodecError::BadMagic { location: "file header", .. })
        ));
    }

    #[test]
    fn test_chunk_type_toc_mismatch_fails() {
        let scene = seeded_scene(2, 4);
        let mut bytes = encode_scene(&scene);
        // Flip the first chunk's type byte in place; its ToC entry still
        // carries the original type
        bytes[HEADER_SIZE + 4] = 0x7E;
        assert!(matches!(
            decode_scene(&bytes),
            Err(CodecError::ChunkTypeMismatch { .. })
        ));
    }

    #[test]
    fn test_missing_mandatory_chunks_fail() {
        // A structurally valid file containing no chunks at all
        let mut writer = ByteWriter::new(Endianness::Little);
        writer.put_bytes(&FILE_MAGIC);
        writer.put_u8(FORMAT_COHORT);
        writer.put_u8(VERSION_MAJOR);
        writer.put_u8(VERSION_MINOR);
        writer.put_u8(Endianness::Little.to_byte());
        writer.put_u32(0);
        writer.put_u32(0);
        writer.put_u32(HEADER_SIZE as u32); // ToC follows the header directly
        writer.put_bytes(&HEADER_FOOTER);
        writer.put_bytes(&TOC_MAGIC);
        writer.put_u8(0);
        writer.put_bytes(&TOC_FOOTER);

        let mut bytes = writer.into_bytes();
        let total = bytes.len() as u32;
        bytes[8..12].copy_from_slice(&total.to_le_bytes());
        let hash = content_hash(&bytes);
        bytes[12..16].copy_from_slice(&hash.to_le_bytes());

        assert!(matches!(
            decode_scene(&bytes),
            Err(CodecError::MissingChunk("scene info"))
        ));
    }

    #[test]
    fn test_failed_load_leaves_live_scene_untouched() {
        let mut live = Scene::new(world());
        live.add_shape(ConvexShape::from_vertices(vec![
            Vec2::new(1.0, 1.0),
            Vec2::new(4.0, 1.0),
            Vec2::new(2.0, 4.0),
        ]));
        live.rebuild_accelerators();

        let path = std::env::temp_dir().join(format!(
            "scene_engine_corrupt_{}.ghcs",
            std::process::id()
        ));
        let mut bytes = encode_scene(&seeded_scene(1, 5));
        bytes.truncate(bytes.len() - 8);
        std::fs::write(&path, &bytes).expect("write temp file");

        assert!(live.load_in_place(&path).is_err());
        assert_eq!(live.shape_count(), 1, "failed load must not clobber the scene");

        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn test_scene_without_tree_chunks_rebuilds_trees() {
        // Produce a file without tree chunks by encoding a scene whose trees
        // are empty; the encoder skips empty trees
        let scene = seeded_scene(4, 12);
        let bytes = encode_scene(&scene);
        let mut stripped = decode_scene(&bytes).expect("decode");
        stripped = Scene::from_decoded(
            stripped.shapes().to_vec(),
            *stripped.world_bounds(),
            crate::spatial::AabbTree::new(),
            crate::spatial::RegionQuadTree::new(),
            Vec::new(),
        );
        let bytes_without_trees = encode_scene(&stripped);

        let decoded = decode_scene(&bytes_without_trees).expect("decode without tree chunks");
        assert!(!decoded.bvh().is_empty(), "missing tree must be rebuilt");
        assert!(!decoded.quadtree().is_empty(), "missing tree must be rebuilt");
        assert_eq!(decoded.bvh().nodes().len(), scene.bvh().nodes().len());
    }

    #[test]
    fn test_save_and_load_through_filesystem() {
        let scene = seeded_scene(6, 8);
        let path = std::env::temp_dir().join(format!(
            "scene_engine_roundtrip_{}.ghcs",
            std::process::id()
        ));
        save_scene(&scene, &path).expect("save");
        let loaded = load_scene(&path).expect("load");
        assert_eq!(loaded.shape_count(), scene.shape_count());
        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn test_empty_file_reports_distinct_error() {
        let path = std::env::temp_dir().join(format!(
            "scene_engine_empty_{}.ghcs",
            std::process::id()
        ));
        std::fs::write(&path, b"").expect("write temp file");
        assert!(matches!(load_scene(&path), Err(CodecError::EmptyFile(_))));
        let _ = std::fs::remove_file(&path);
    }
}
