use crate::buffer::{PixelBuffer, opaque_pixels};
use crate::color::{Color, from_f32_channels};
use crate::error::{PaletteError, Result};

use super::AlgorithmId;

const MAX_SIDE: u32 = 200;
const MAX_DEPTH: usize = 6;
const MAX_LEAVES: usize = 6;

const NO_CHILD: u32 = 0;

#[derive(Debug, Default, Clone)]
struct Node {
    /// Arena indices; `NO_CHILD` marks an empty slot (the root is never a child).
    children: [u32; 8],
    count: u32,
    sum: [u64; 3],
}

/// Octree over RGB bit-planes, stored as a flat arena owned by one call.
#[derive(Debug)]
struct Octree {
    nodes: Vec<Node>,
}

impl Octree {
    fn new() -> Self {
        Self {
            nodes: vec![Node::default()],
        }
    }

    fn insert(&mut self, [r, g, b]: [u8; 3]) {
        let mut node = 0usize;
        for level in 0..MAX_DEPTH {
            let shift = 7 - level;
            let slot = usize::from(((r >> shift) & 1) << 2 | ((g >> shift) & 1) << 1 | ((b >> shift) & 1));
            let child = self.nodes[node].children[slot];
            node = if child == NO_CHILD {
                let index = self.nodes.len();
                self.nodes.push(Node::default());
                self.nodes[node].children[slot] = index as u32;
                index
            } else {
                child as usize
            };
        }
        let leaf = &mut self.nodes[node];
        leaf.count += 1;
        leaf.sum[0] += u64::from(r);
        leaf.sum[1] += u64::from(g);
        leaf.sum[2] += u64::from(b);
    }

    /// Populated leaves in depth-first, child-slot order.
    fn leaves(&self) -> Vec<&Node> {
        let mut out = Vec::new();
        let mut stack = vec![0usize];
        while let Some(index) = stack.pop() {
            let node = &self.nodes[index];
            if node.count > 0 {
                out.push(node);
                continue;
            }
            stack.extend(
                node.children
                    .iter()
                    .rev()
                    .filter(|&&c| c != NO_CHILD)
                    .map(|&c| c as usize),
            );
        }
        out
    }
}

/// Buckets pixels by their top six bits per channel and returns the average
/// color of the six most populated buckets, most populated first.
pub(super) fn extract(buffer: &PixelBuffer) -> Result<Vec<Color>> {
    let image = buffer.downscaled(MAX_SIDE);
    let mut tree = Octree::new();
    let mut inserted = 0usize;
    for (_, _, c) in opaque_pixels(&image) {
        tree.insert([c.red, c.green, c.blue]);
        inserted += 1;
    }
    if inserted == 0 {
        return Err(PaletteError::failure(AlgorithmId::Octree, "no opaque pixels"));
    }

    let mut leaves = tree.leaves();
    leaves.sort_by(|a, b| b.count.cmp(&a.count));
    Ok(leaves
        .into_iter()
        .take(MAX_LEAVES)
        .map(|leaf| {
            let n = leaf.count as f32;
            from_f32_channels(
                leaf.sum[0] as f32 / n,
                leaf.sum[1] as f32 / n,
                leaf.sum[2] as f32 / n,
            )
        })
        .collect())
}

#[cfg(test)]
mod test {
    use palette::Srgb;

    use super::*;

    #[test]
    fn nearby_colors_share_a_leaf() {
        let mut tree = Octree::new();
        tree.insert([200, 16, 16]);
        tree.insert([201, 17, 18]);
        tree.insert([16, 16, 200]);
        let leaves = tree.leaves();
        assert_eq!(leaves.len(), 2);
        assert_eq!(leaves.iter().map(|l| l.count).sum::<u32>(), 3);
    }

    #[test]
    fn most_populated_leaf_first() {
        let mut data = Vec::new();
        for i in 0..20 {
            let px: [u8; 4] = if i < 5 { [30, 200, 60, 255] } else { [200, 40, 90, 255] };
            data.extend_from_slice(&px);
        }
        let buffer = PixelBuffer::new(5, 4, data).unwrap_or_else(|e| panic!("{e}"));
        let colors = extract(&buffer).unwrap_or_else(|e| panic!("{e}"));
        assert_eq!(colors, vec![Srgb::new(200, 40, 90), Srgb::new(30, 200, 60)]);
        assert_eq!(extract(&buffer).ok(), Some(colors));
    }

    #[test]
    fn keeps_at_most_six_leaves() {
        let mut data = Vec::new();
        for i in 0..64u32 {
            data.extend_from_slice(&[(i * 4) as u8, 255 - (i * 4) as u8, (i * 2) as u8, 255]);
        }
        let buffer = PixelBuffer::new(8, 8, data).unwrap_or_else(|e| panic!("{e}"));
        assert_eq!(extract(&buffer).map(|c| c.len()).ok(), Some(MAX_LEAVES));
    }
}
