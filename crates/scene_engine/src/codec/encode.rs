//! Scene serialization
//!
//! Writes the header with zeroed size/hash/ToC fields, streams every chunk,
//! re-emits preserved unknown chunks when the scene is unmodified, writes the
//! table of contents, and finally backpatches the three header fields.

use crate::codec::buffer::{ByteWriter, Endianness};
use crate::codec::{
    chunk_type, content_hash, CHUNK_FOOTER, CHUNK_FOOTER_SIZE, CHUNK_HEADER_SIZE, CHUNK_MAGIC,
    CHUNK_OVERHEAD, FILE_MAGIC, FORMAT_COHORT, HEADER_FOOTER, TOC_FOOTER, TOC_MAGIC,
    UNRESOLVED_SHAPE, VERSION_MAJOR, VERSION_MINOR,
};
use crate::scene::Scene;
use crate::spatial::SpatialNode;

/// Offsets of the backpatched header fields
const TOTAL_SIZE_OFFSET: usize = 8;
const HASH_OFFSET: usize = 12;
const TOC_OFFSET_OFFSET: usize = 16;

/// Bookkeeping for one written chunk, later emitted into the ToC
struct ChunkRecord {
    chunk_type: u8,
    start: usize,
    data_start: usize,
    data_end: usize,
}

impl ChunkRecord {
    fn total_size(&self) -> u32 {
        (self.data_end - self.data_start + CHUNK_OVERHEAD) as u32
    }
}

/// Serialize a scene into the chunked container format
pub fn encode_scene(scene: &Scene) -> Vec<u8> {
    let mut writer = ByteWriter::new(Endianness::Little);
    let mut records: Vec<ChunkRecord> = Vec::new();

    // --- File header, with placeholders for the backpatched fields ---
    writer.put_bytes(&FILE_MAGIC);
    writer.put_u8(FORMAT_COHORT);
    writer.put_u8(VERSION_MAJOR);
    writer.put_u8(VERSION_MINOR);
    writer.put_u8(Endianness::Little.to_byte());
    writer.put_u32(0); // total file size
    writer.put_u32(0); // content hash
    writer.put_u32(0); // table-of-contents offset
    writer.put_bytes(&HEADER_FOOTER);

    let shape_count = scene.shape_count() as u16;

    // --- Scene info ---
    {
        let record = begin_chunk(&mut writer, &mut records, chunk_type::SCENE_INFO);
        writer.put_aabb2(scene.world_bounds());
        writer.put_u16(shape_count);
        end_chunk(&mut writer, &mut records, record);
    }

    // --- Convex polygons ---
    {
        let record = begin_chunk(&mut writer, &mut records, chunk_type::CONVEX_POLYS);
        writer.put_u16(shape_count);
        for shape in scene.shapes() {
            let vertices = shape.polygon().vertices();
            writer.put_u8(vertices.len() as u8);
            for v in vertices {
                writer.put_vec2(*v);
            }
        }
        end_chunk(&mut writer, &mut records, record);
    }

    // --- Bounding discs ---
    {
        let record = begin_chunk(&mut writer, &mut records, chunk_type::BOUNDING_DISCS);
        writer.put_u16(shape_count);
        for shape in scene.shapes() {
            let disc = shape.bounding_disc();
            writer.put_vec2(disc.center);
            writer.put_f32(disc.radius);
        }
        end_chunk(&mut writer, &mut records, record);
    }

    // --- Convex hulls ---
    {
        let record = begin_chunk(&mut writer, &mut records, chunk_type::CONVEX_HULLS);
        writer.put_u16(shape_count);
        for shape in scene.shapes() {
            let planes = shape.hull().planes();
            writer.put_u8(planes.len() as u8);
            for plane in planes {
                writer.put_plane2(plane);
            }
        }
        end_chunk(&mut writer, &mut records, record);
    }

    // --- Bounding boxes ---
    {
        let record = begin_chunk(&mut writer, &mut records, chunk_type::BOUNDING_BOXES);
        writer.put_u16(shape_count);
        for shape in scene.shapes() {
            writer.put_aabb2(shape.bounding_box());
        }
        end_chunk(&mut writer, &mut records, record);
    }

    // --- Bounding-box tree ---
    if !scene.bvh().is_empty() {
        let record = begin_chunk(&mut writer, &mut records, chunk_type::BVH_TREE);
        writer.put_u8(1); // validity flag
        writer.put_u32(scene.bvh().nodes().len() as u32);
        writer.put_u32(scene.bvh().first_leaf() as u32);
        write_tree_nodes(&mut writer, scene.bvh().nodes(), scene.shape_count());
        end_chunk(&mut writer, &mut records, record);
    }

    // --- Region quadtree ---
    if !scene.quadtree().is_empty() {
        let record = begin_chunk(&mut writer, &mut records, chunk_type::QUAD_TREE);
        writer.put_u32(scene.quadtree().nodes().len() as u32);
        write_tree_nodes(&mut writer, scene.quadtree().nodes(), scene.shape_count());
        end_chunk(&mut writer, &mut records, record);
    }

    // --- Unknown chunks from the loaded file, verbatim, only while the
    // scene still matches what was loaded ---
    if !scene.is_modified() {
        for preserved in scene.preserved_chunks() {
            let start = writer.len();
            writer.put_bytes(&preserved.raw);
            records.push(ChunkRecord {
                chunk_type: preserved.chunk_type,
                start,
                data_start: start + CHUNK_HEADER_SIZE,
                data_end: writer.len() - CHUNK_FOOTER_SIZE,
            });
        }
    }

    // --- Table of contents ---
    let toc_offset = writer.len();
    writer.overwrite_u32(TOC_OFFSET_OFFSET, toc_offset as u32);

    writer.put_bytes(&TOC_MAGIC);
    writer.put_u8(records.len() as u8);
    for record in &records {
        writer.put_u8(record.chunk_type);
        writer.put_u32(record.start as u32);
        writer.put_u32(record.total_size());
    }
    writer.put_bytes(&TOC_FOOTER);

    // --- Backpatch the total size, then hash everything after the header
    // (the hashed region includes the ToC but none of the header fields) ---
    let total_size = writer.len() as u32;
    writer.overwrite_u32(TOTAL_SIZE_OFFSET, total_size);

    let mut bytes = writer.into_bytes();
    let hash = content_hash(&bytes);
    bytes[HASH_OFFSET..HASH_OFFSET + 4].copy_from_slice(&hash.to_le_bytes());
    bytes
}

fn begin_chunk(writer: &mut ByteWriter, records: &mut Vec<ChunkRecord>, chunk_type: u8) -> usize {
    let start = writer.len();
    writer.put_bytes(&CHUNK_MAGIC);
    writer.put_u8(chunk_type);
    writer.put_u8(Endianness::Little.to_byte());
    writer.put_u32(0); // payload length, backpatched in end_chunk
    records.push(ChunkRecord {
        chunk_type,
        start,
        data_start: writer.len(),
        data_end: 0,
    });
    records.len() - 1
}

fn end_chunk(writer: &mut ByteWriter, records: &mut [ChunkRecord], index: usize) {
    let record = &mut records[index];
    record.data_end = writer.len();
    let payload_len = (record.data_end - record.data_start) as u32;
    writer.overwrite_u32(record.data_start - 4, payload_len);
    writer.put_bytes(&CHUNK_FOOTER);
}

/// Per-node payload shared by both tree chunks: bounds, member count, and
/// member shape indices (the sentinel marks a reference that does not resolve
/// against the current shape list)
fn write_tree_nodes(writer: &mut ByteWriter, nodes: &[SpatialNode], shape_count: usize) {
    for node in nodes {
        writer.put_aabb2(&node.bounds);
        writer.put_u16(node.shapes.len() as u16);
        for &shape in &node.shapes {
            let index = if (shape as usize) < shape_count {
                shape
            } else {
                UNRESOLVED_SHAPE
            };
            writer.put_u16(index);
        }
    }
}
