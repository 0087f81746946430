use super::store::{NodeId, Pool};
use super::{child_index, MAX_DEPTH};
use crate::color::{distance_sq, Color, MAX_PALETTE_COLORS};
use crate::error::{Error, Result};
use image::imageops::ColorMap;

const NO_CHILDREN: [Option<NodeId>; 8] = [None; 8];

#[derive(Debug)]
enum Node {
    Branch([Option<NodeId>; 8]),
    Leaf { color: Color, index: usize },
}

impl Default for Node {
    fn default() -> Self {
        Self::Branch(NO_CHILDREN)
    }
}

impl Node {
    #[inline]
    fn children(&self) -> &[Option<NodeId>; 8] {
        match self {
            Self::Branch(children) => children,
            Self::Leaf { .. } => &NO_CHILDREN,
        }
    }
}

struct Visitor {
    color: Color,
    best: Option<(u32, usize)>,
}

impl Visitor {
    #[inline]
    fn visit(&mut self, color: Color, index: usize) {
        let distance = distance_sq(self.color, color);
        if self.best.map_or(true, |(best, _)| distance < best) {
            self.best = Some((distance, index));
        }
    }
}

/// Fixed-depth octree over a small palette, answering nearest color queries.
///
/// The search descends along the query's own address and stops at the first
/// missing child, then scans only the subtree it reached. A closer entry in a
/// sibling subtree is never considered, so the answer is an approximation
/// that works well when the palette is sparse. Use
/// [`LinearPalette`](crate::LinearPalette) for an exact search.
#[derive(Debug)]
pub struct StaticIndex {
    pool: Pool<Node>,
    root: NodeId,
    palette: Vec<Color>,
}

impl StaticIndex {
    /// Builds the index. Entries with equal colors share one leaf and the
    /// later entry wins.
    pub fn build(palette: &[Color]) -> Result<Self> {
        if palette.len() > MAX_PALETTE_COLORS {
            return Err(Error::TooManyColors);
        }
        let mut pool = Pool::<Node>::default();
        let root = pool.create();
        for (index, &color) in palette.iter().enumerate() {
            let mut node_id = root;
            for depth in 1..=MAX_DEPTH {
                let slot = child_index(color, depth);
                node_id = match pool.get(node_id).children()[slot] {
                    Some(child_id) => child_id,
                    None => {
                        let child_id = pool.create();
                        if let Node::Branch(children) = pool.get_mut(node_id) {
                            children[slot] = Some(child_id);
                        }
                        child_id
                    }
                };
            }
            *pool.get_mut(node_id) = Node::Leaf { color, index };
        }
        Ok(Self {
            pool,
            root,
            palette: palette.to_vec(),
        })
    }

    #[inline]
    pub fn palette(&self) -> &[Color] {
        &self.palette
    }

    /// Palette index of the closest leaf under the deepest node matching
    /// `color`'s address. Ties go to the leaf met first in child order.
    /// Returns `None` only for an index built from an empty palette.
    pub fn find_nearest(&self, color: Color) -> Option<usize> {
        let mut node_id = self.root;
        for depth in 1..=MAX_DEPTH {
            match self.pool.get(node_id).children()[child_index(color, depth)] {
                Some(child_id) => node_id = child_id,
                None => break,
            }
        }
        let mut visitor = Visitor { color, best: None };
        self.search(node_id, &mut visitor);
        visitor.best.map(|(_, index)| index)
    }

    // depth is bounded by MAX_DEPTH
    fn search(&self, node_id: NodeId, visitor: &mut Visitor) {
        match self.pool.get(node_id) {
            Node::Leaf { color, index } => visitor.visit(*color, *index),
            Node::Branch(children) => {
                for &child_id in children.iter().flatten() {
                    self.search(child_id, visitor);
                }
            }
        }
    }
}

/// Requires a non-empty palette: `index_of` on an empty index returns 0,
/// which [`lookup`](ColorMap::lookup) does not resolve. Callers that cannot
/// rule this out should use [`StaticIndex::find_nearest`] or
/// [`dither`](crate::dither), which report the empty case.
impl ColorMap for StaticIndex {
    type Color = Color;

    #[inline(always)]
    fn index_of(&self, color: &Self::Color) -> usize {
        self.find_nearest(*color).unwrap_or_default()
    }

    #[inline(always)]
    fn lookup(&self, index: usize) -> Option<Self::Color> {
        self.palette.get(index).copied()
    }

    fn has_lookup(&self) -> bool {
        true
    }

    #[inline(always)]
    fn map_color(&self, color: &mut Self::Color) {
        if let Some(index) = self.find_nearest(*color) {
            *color = self.palette[index];
        }
    }
}
