//! Scene deserialization
//!
//! Walks the table of contents rather than scanning linearly, validates every
//! structural boundary, and assembles the scene in temporaries so a failure
//! partway through never disturbs the caller's live scene. Missing optional
//! data (hulls, bounding volumes, either tree) is regenerated from the shape
//! list after all chunks are processed.

use crate::codec::buffer::{ByteReader, Endianness};
use crate::codec::{
    chunk_type, content_hash, CodecError, UnknownChunk, CHUNK_FOOTER, CHUNK_MAGIC, CHUNK_OVERHEAD,
    FILE_MAGIC, HEADER_FOOTER, MIN_FILE_SIZE, TOC_FOOTER, TOC_MAGIC,
};
use crate::geometry::{Aabb2, BoundingDisc, ConvexHull, ConvexPolygon, ConvexShape};
use crate::scene::{Scene, DEFAULT_QUADTREE_DEPTH};
use crate::spatial::{bvh_depth_for, AabbTree, RegionQuadTree, ShapeIndex, SpatialNode};

struct TocEntry {
    chunk_type: u8,
    start: u32,
    total_size: u32,
}

/// Shape parts gathered across chunks before assembly
struct PendingShape {
    polygon: ConvexPolygon,
    hull: Option<ConvexHull>,
    disc: Option<BoundingDisc>,
    bounds: Option<Aabb2>,
}

/// Decode a scene from the chunked container format
pub fn decode_scene(bytes: &[u8]) -> Result<Scene, CodecError> {
    if bytes.len() < MIN_FILE_SIZE {
        return Err(CodecError::TooSmall(bytes.len()));
    }

    let mut reader = ByteReader::new(bytes, Endianness::Little);

    // --- File header ---
    if reader.take_bytes(4)? != FILE_MAGIC {
        return Err(CodecError::BadMagic { location: "file header", offset: 0 });
    }
    let _cohort = reader.take_u8()?;
    let _major = reader.take_u8()?;
    let _minor = reader.take_u8()?;
    let endian_byte = reader.take_u8()?;
    let file_endianness =
        Endianness::from_byte(endian_byte).ok_or(CodecError::UnsupportedEndianness(endian_byte))?;
    reader.set_endianness(file_endianness);

    let total_size = reader.take_u32()?;
    let stored_hash = reader.take_u32()?;
    let toc_offset = reader.take_u32()? as usize;

    // Size and hash are diagnostic fields; disagreement is worth a warning
    // but not a failed load
    if total_size as usize != bytes.len() {
        log::warn!(
            "recorded file size {} disagrees with actual size {}",
            total_size,
            bytes.len()
        );
    }
    let computed_hash = content_hash(bytes);
    if stored_hash != computed_hash {
        log::warn!(
            "content hash mismatch (stored {stored_hash:#010x}, computed {computed_hash:#010x})"
        );
    }

    let footer_offset = reader.position();
    if reader.take_bytes(4)? != HEADER_FOOTER {
        return Err(CodecError::BadMagic { location: "header footer", offset: footer_offset });
    }

    // --- Table of contents ---
    if toc_offset + 9 > bytes.len() {
        return Err(CodecError::TocOutOfRange { offset: toc_offset, len: bytes.len() });
    }
    reader.set_position(toc_offset)?;
    if reader.take_bytes(4)? != TOC_MAGIC {
        return Err(CodecError::BadMagic { location: "table of contents", offset: toc_offset });
    }
    let chunk_count = reader.take_u8()?;
    let mut toc_entries = Vec::with_capacity(chunk_count as usize);
    for _ in 0..chunk_count {
        toc_entries.push(TocEntry {
            chunk_type: reader.take_u8()?,
            start: reader.take_u32()?,
            total_size: reader.take_u32()?,
        });
    }
    let toc_footer_offset = reader.position();
    if reader.take_bytes(4)? != TOC_FOOTER {
        return Err(CodecError::BadMagic {
            location: "table-of-contents footer",
            offset: toc_footer_offset,
        });
    }

    // --- Chunk dispatch ---
    let mut pending: Vec<PendingShape> = Vec::new();
    let mut preserved: Vec<UnknownChunk> = Vec::new();
    let mut scene_bounds: Option<Aabb2> = None;
    let mut recorded_count: Option<u16> = None;
    let mut has_polys = false;
    let mut has_hulls = false;
    let mut has_discs = false;
    let mut has_boxes = false;
    let mut loaded_bvh: Option<AabbTree> = None;
    let mut loaded_quadtree: Option<RegionQuadTree> = None;

    for entry in &toc_entries {
        let start = entry.start as usize;
        if start + CHUNK_OVERHEAD > bytes.len() {
            return Err(CodecError::ChunkOutOfRange(start));
        }
        reader.set_position(start)?;

        if reader.take_bytes(4)? != CHUNK_MAGIC {
            return Err(CodecError::BadMagic { location: "chunk", offset: start });
        }
        let chunk_kind = reader.take_u8()?;
        if chunk_kind != entry.chunk_type {
            return Err(CodecError::ChunkTypeMismatch { header: chunk_kind, toc: entry.chunk_type });
        }

        // Each chunk may carry its own byte order; an unrecognized byte
        // leaves the current order in effect
        let chunk_endian_byte = reader.take_u8()?;
        if let Some(endianness) = Endianness::from_byte(chunk_endian_byte) {
            reader.set_endianness(endianness);
        }

        let declared = reader.take_u32()?;
        let data_start = reader.position();
        if data_start + declared as usize + 4 > bytes.len() {
            return Err(CodecError::TruncatedChunk { offset: start, declared });
        }

        match chunk_kind {
            chunk_type::SCENE_INFO => {
                scene_bounds = Some(reader.take_aabb2()?);
                recorded_count = Some(reader.take_u16()?);
            }
            chunk_type::CONVEX_POLYS => {
                has_polys = true;
                let count = reader.take_u16()?;
                if let Some(recorded) = recorded_count {
                    if recorded != count {
                        return Err(CodecError::ShapeCountMismatch);
                    }
                }
                for _ in 0..count {
                    let vertex_count = reader.take_u8()?;
                    let mut vertices = Vec::with_capacity(vertex_count as usize);
                    for _ in 0..vertex_count {
                        vertices.push(reader.take_vec2()?);
                    }
                    pending.push(PendingShape {
                        polygon: ConvexPolygon::new(vertices),
                        hull: None,
                        disc: None,
                        bounds: None,
                    });
                }
            }
            chunk_type::CONVEX_HULLS => {
                has_hulls = true;
                let count = reader.take_u16()?;
                for i in 0..count as usize {
                    if i >= pending.len() {
                        break;
                    }
                    let plane_count = reader.take_u8()?;
                    let mut planes = Vec::with_capacity(plane_count as usize);
                    for _ in 0..plane_count {
                        planes.push(reader.take_plane2()?);
                    }
                    pending[i].hull = Some(ConvexHull::new(planes));
                }
            }
            chunk_type::BOUNDING_DISCS => {
                has_discs = true;
                let count = reader.take_u16()?;
                for i in 0..count as usize {
                    if i >= pending.len() {
                        break;
                    }
                    let center = reader.take_vec2()?;
                    let radius = reader.take_f32()?;
                    pending[i].disc = Some(BoundingDisc::new(center, radius));
                }
            }
            chunk_type::BOUNDING_BOXES => {
                has_boxes = true;
                let count = reader.take_u16()?;
                for i in 0..count as usize {
                    if i >= pending.len() {
                        break;
                    }
                    pending[i].bounds = Some(reader.take_aabb2()?);
                }
            }
            chunk_type::BVH_TREE => {
                let _validity = reader.take_u8()?;
                let node_count = reader.take_u32()?;
                let first_leaf = reader.take_u32()? as usize;
                let nodes = read_tree_nodes(&mut reader, node_count, pending.len())?;
                loaded_bvh = Some(AabbTree::from_parts(nodes, first_leaf));
            }
            chunk_type::QUAD_TREE => {
                let node_count = reader.take_u32()?;
                let nodes = read_tree_nodes(&mut reader, node_count, pending.len())?;
                loaded_quadtree = Some(RegionQuadTree::from_parts(nodes));
            }
            _ => {
                // Unknown chunk: skip the payload, raw bytes are captured
                // below once the footer checks out
                reader.set_position(data_start + declared as usize)?;
            }
        }

        let consumed = reader.position() - data_start;
        if consumed != declared as usize {
            return Err(CodecError::PayloadSizeMismatch { offset: start, consumed, declared });
        }

        let chunk_footer_offset = reader.position();
        if reader.take_bytes(4)? != CHUNK_FOOTER {
            return Err(CodecError::BadMagic { location: "chunk footer", offset: chunk_footer_offset });
        }

        let chunk_end = reader.position();
        if chunk_end - start != entry.total_size as usize {
            return Err(CodecError::TocSizeMismatch(start));
        }

        if !chunk_type::is_known(chunk_kind) {
            preserved.push(UnknownChunk {
                chunk_type: chunk_kind,
                endianness: chunk_endian_byte,
                raw: bytes[start..chunk_end].to_vec(),
            });
        }
    }

    // --- Mandatory chunks ---
    let world_bounds = scene_bounds.ok_or(CodecError::MissingChunk("scene info"))?;
    if !has_polys {
        return Err(CodecError::MissingChunk("convex polygons"));
    }

    // --- Assemble shapes, regenerating whatever the file left out ---
    let use_loaded_volumes = has_discs && has_boxes;
    let mut shapes = Vec::with_capacity(pending.len());
    for part in pending {
        let mut shape = ConvexShape::from_polygon(part.polygon);
        if has_hulls {
            if let Some(hull) = part.hull {
                if !hull.planes().is_empty() {
                    shape.set_hull(hull);
                }
            }
        }
        if use_loaded_volumes {
            if let (Some(disc), Some(bounds)) = (part.disc, part.bounds) {
                shape.set_bounding_volumes(disc, bounds);
            }
        }
        shapes.push(shape);
    }

    // --- Restore or rebuild the accelerators ---
    let bvh = match loaded_bvh {
        Some(tree) => tree,
        None => {
            let mut tree = AabbTree::new();
            tree.build(&shapes, bvh_depth_for(shapes.len()), world_bounds);
            tree
        }
    };
    let quadtree = match loaded_quadtree {
        Some(tree) => tree,
        None => {
            let mut tree = RegionQuadTree::new();
            tree.build(&shapes, DEFAULT_QUADTREE_DEPTH, world_bounds);
            tree
        }
    };

    Ok(Scene::from_decoded(shapes, world_bounds, bvh, quadtree, preserved))
}

/// Per-node payload shared by both tree chunks
///
/// Shape indices that do not resolve against the decoded shape list (the
/// sentinel included) are dropped.
fn read_tree_nodes(
    reader: &mut ByteReader<'_>,
    node_count: u32,
    shape_count: usize,
) -> Result<Vec<SpatialNode>, CodecError> {
    let mut nodes = Vec::new();
    for _ in 0..node_count {
        let bounds = reader.take_aabb2()?;
        let member_count = reader.take_u16()?;
        let mut members = Vec::with_capacity(member_count as usize);
        for _ in 0..member_count {
            let index: ShapeIndex = reader.take_u16()?;
            if (index as usize) < shape_count {
                members.push(index);
            }
        }
        nodes.push(SpatialNode { bounds, shapes: members });
    }
    Ok(nodes)
}
