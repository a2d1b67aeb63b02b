//! Container access: JSON document plus the raw bytes of its buffers

use std::borrow::Cow;

use gltf::json;
use gltf::json::validation::Checked;

use crate::accessor::{AccessorLayout, AccessorView};
use crate::error::{LoadError, Result};

/// A parsed container document with its buffer bytes
///
/// The JSON chunk is deserialized without index validation, so out-of-range
/// references are reported by the loader as `DanglingIndex` or
/// `UnresolvedReference` instead of failing up front.
pub struct Container<'a> {
    root: json::Root,
    /// One entry per `root.buffers`; `None` when no bytes were supplied
    buffers: Vec<Option<Cow<'a, [u8]>>>,
}

impl<'a> Container<'a> {
    /// Split a GLB file in memory
    ///
    /// The BIN chunk backs buffer 0 when that buffer has no `uri`.
    pub fn from_glb(bytes: &'a [u8]) -> Result<Self> {
        let glb = gltf::Glb::from_slice(bytes)?;
        let root: json::Root = serde_json::from_slice(&glb.json)?;

        let mut bin = glb.bin;
        let buffers = root
            .buffers
            .iter()
            .enumerate()
            .map(|(i, buffer)| {
                if i == 0 && buffer.uri.is_none() {
                    bin.take()
                } else {
                    None
                }
            })
            .collect();

        Ok(Self { root, buffers })
    }

    /// Pair an already-parsed document with caller-supplied buffer bytes
    ///
    /// `buffers[i]` backs `root.buffers[i]`; buffers beyond the supplied list have
    /// no data and fail with `MissingBufferData` when read.
    pub fn from_parts(root: json::Root, buffers: Vec<Vec<u8>>) -> Container<'static> {
        let mut supplied = buffers.into_iter();
        let buffers = (0..root.buffers.len())
            .map(|_| supplied.next().map(Cow::Owned))
            .collect();
        Container { root, buffers }
    }

    pub fn root(&self) -> &json::Root {
        &self.root
    }

    /// Raw bytes of buffer `index`
    pub fn buffer(&self, index: usize) -> Result<&[u8]> {
        self.buffers
            .get(index)
            .ok_or(LoadError::DanglingIndex {
                kind: "buffer",
                index,
            })?
            .as_deref()
            .ok_or(LoadError::MissingBufferData { buffer: index })
    }

    /// Resolve accessor `index` through its buffer view into a read view
    pub fn accessor(&self, index: usize) -> Result<AccessorView<'_>> {
        let accessor = self
            .root
            .accessors
            .get(index)
            .ok_or(LoadError::DanglingIndex {
                kind: "accessor",
                index,
            })?;

        if accessor.sparse.is_some() {
            return Err(LoadError::SparseAccessor { accessor: index });
        }

        let view_index = accessor
            .buffer_view
            .ok_or(LoadError::MissingBufferView { accessor: index })?
            .value();
        let view = self
            .root
            .buffer_views
            .get(view_index)
            .ok_or(LoadError::DanglingIndex {
                kind: "buffer view",
                index: view_index,
            })?;

        let bytes = self.buffer(view.buffer.value())?;

        // Clip to the buffer view first so a stride can never reach into a neighbour
        let view_offset = view.byte_offset.map_or(0, |o| o.0 as usize);
        let view_end = view_offset
            .checked_add(view.byte_length.0 as usize)
            .unwrap_or(usize::MAX);
        if view_end > bytes.len() {
            return Err(LoadError::TruncatedBuffer {
                accessor: index,
                required: view_end,
                available: bytes.len(),
            });
        }
        let view_bytes = &bytes[view_offset..view_end];

        let component_type = match &accessor.component_type {
            Checked::Valid(c) => c.0.into(),
            Checked::Invalid => {
                return Err(LoadError::UnsupportedComponentType {
                    accessor: index,
                    component_type: "unknown".to_string(),
                    usage: "accessor",
                });
            }
        };
        let element_type = match &accessor.type_ {
            Checked::Valid(t) => (*t).into(),
            Checked::Invalid => {
                return Err(LoadError::UnsupportedElementType {
                    accessor: index,
                    element_type: "unknown".to_string(),
                    usage: "accessor",
                });
            }
        };

        AccessorView::new(
            view_bytes,
            AccessorLayout {
                index,
                byte_offset: accessor.byte_offset.map_or(0, |o| o.0 as usize),
                byte_stride: view.byte_stride.map(|s| s.0),
                component_type,
                element_type,
                count: accessor.count.0 as usize,
                normalized: accessor.normalized,
            },
        )
    }

    /// Whether the document declares `extension` in `extensionsUsed`
    pub fn uses_extension(&self, extension: &str) -> bool {
        self.root.extensions_used.iter().any(|e| e == extension)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glb_builder::{BufferBuilder, GltfBuilder, MeshBuilder, assemble_glb};

    fn triangle() -> (json::Root, Vec<u8>) {
        let mut buffer = BufferBuilder::new();
        let mesh = MeshBuilder::new()
            .positions(&[[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.5, 1.0, 0.0]])
            .indices(&[0, 1, 2])
            .build(&mut buffer);
        let root = GltfBuilder::new()
            .buffer_byte_length(buffer.data().len() as u64)
            .add_mesh_from_accessors("Triangle", &mesh)
            .build(buffer.views(), buffer.accessors(), "test");
        (root, buffer.data().to_vec())
    }

    #[test]
    fn test_from_glb_binds_bin_chunk() {
        let (root, data) = triangle();
        let glb = assemble_glb(&root, &data);

        let container = Container::from_glb(&glb).expect("valid glb");
        let positions = container.accessor(0).expect("accessor 0");
        assert_eq!(positions.count(), 3);
        assert_eq!(
            positions.read_floats::<3>("POSITION", false).unwrap()[2],
            [0.5, 1.0, 0.0]
        );
    }

    #[test]
    fn test_from_glb_rejects_garbage() {
        assert!(matches!(
            Container::from_glb(b"not a glb file at all"),
            Err(LoadError::InvalidContainer(_))
        ));
    }

    #[test]
    fn test_dangling_accessor() {
        let (root, data) = triangle();
        let container = Container::from_parts(root, vec![data]);
        assert!(matches!(
            container.accessor(99),
            Err(LoadError::DanglingIndex {
                kind: "accessor",
                index: 99
            })
        ));
    }

    #[test]
    fn test_missing_buffer_data() {
        let (root, _) = triangle();
        let container = Container::from_parts(root, Vec::new());
        assert!(matches!(
            container.accessor(0),
            Err(LoadError::MissingBufferData { buffer: 0 })
        ));
    }

    #[test]
    fn test_view_past_end_of_buffer() {
        let (root, data) = triangle();
        // Drop the last few bytes: the index view no longer fits
        let short = data[..data.len() - 4].to_vec();
        let container = Container::from_parts(root, vec![short]);
        assert!(matches!(
            container.accessor(1),
            Err(LoadError::TruncatedBuffer { accessor: 1, .. })
        ));
        // Positions are still intact
        assert!(container.accessor(0).is_ok());
    }

    #[test]
    fn test_uses_extension() {
        let (mut root, data) = triangle();
        root.extensions_used
            .push("KHR_materials_pbrSpecularGlossiness".to_string());
        let container = Container::from_parts(root, vec![data]);
        assert!(container.uses_extension("KHR_materials_pbrSpecularGlossiness"));
        assert!(!container.uses_extension("KHR_texture_transform"));
    }
}
