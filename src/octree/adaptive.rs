use super::store::{LevelRegistry, Linked, Links, NodeId, Pool};
use super::{child_index, MAX_DEPTH};
use crate::color::{Color, MAX_PALETTE_COLORS};
use crate::error::Result;
use image::Rgb;
use log::{debug, info, warn};
use std::iter;
use std::time::Instant;

/// Accumulated population of one output color.
#[derive(Debug, Default, Clone, Copy)]
struct Leaf {
    sums: [u64; 3],
    count: u64,
}

impl Leaf {
    fn add(&mut self, color: Color) {
        self.count += 1;
        iter::zip(&mut self.sums, color.0).for_each(|(a, b)| *a += b as u64)
    }

    fn merge(&mut self, leaf: &Leaf) {
        self.count += leaf.count;
        iter::zip(&mut self.sums, leaf.sums).for_each(|(a, b)| *a += b)
    }

    fn color(&self) -> Option<Color> {
        (self.count > 0).then(|| Rgb(self.sums.map(|s| (s / self.count) as u8)))
    }
}

#[derive(Debug)]
enum Payload {
    Internal([Option<NodeId>; 8]),
    Leaf(Leaf),
}

impl Default for Payload {
    fn default() -> Self {
        Self::Internal([None; 8])
    }
}

#[derive(Debug, Default)]
struct Node {
    population: u64,
    links: Links,
    payload: Payload,
}

impl Node {
    #[inline]
    fn is_leaf(&self) -> bool {
        matches!(self.payload, Payload::Leaf(_))
    }
}

impl Linked for Node {
    fn links(&self) -> &Links {
        &self.links
    }

    fn links_mut(&mut self) -> &mut Links {
        &mut self.links
    }
}

/// Full-depth octree over an image's pixels, reduced greedily into a palette.
///
/// Every node below the root is registered in the list of its depth, so a
/// reduction pass can visit one level without walking the tree.
#[derive(Debug)]
pub struct AdaptiveTree {
    pool: Pool<Node>,
    root: NodeId,
    registry: LevelRegistry,
    leaf_count: usize,
}

impl Default for AdaptiveTree {
    fn default() -> Self {
        Self::new()
    }
}

impl AdaptiveTree {
    pub fn new() -> Self {
        let mut pool = Pool::<Node>::default();
        let root = pool.create();
        Self {
            pool,
            root,
            registry: LevelRegistry::default(),
            leaf_count: 0,
        }
    }

    /// Number of nodes currently flagged as leaves.
    #[inline]
    pub fn leaf_count(&self) -> usize {
        self.leaf_count
    }

    /// Number of colors inserted so far.
    #[inline]
    pub fn population(&self) -> u64 {
        self.pool.get(self.root).population
    }

    /// Number of nodes registered at `depth` (1..=8).
    #[inline]
    pub fn level_len(&self, depth: u8) -> usize {
        self.registry.level(depth).len()
    }

    fn spawn(&mut self, depth: u8) -> NodeId {
        let id = self.pool.create();
        self.registry.push(&mut self.pool, depth, id);
        if depth == MAX_DEPTH {
            self.pool.get_mut(id).payload = Payload::Leaf(Leaf::default());
            self.leaf_count += 1;
        }
        id
    }

    /// Adds one pixel. The walk stops at the first leaf on the color's path,
    /// which is depth 8 unless the tree was already reduced.
    pub fn insert(&mut self, color: Color) {
        let mut node_id = self.root;
        let mut depth = 0u8;
        loop {
            let node = self.pool.get_mut(node_id);
            node.population += 1;
            let children = match &mut node.payload {
                Payload::Leaf(leaf) => {
                    leaf.add(color);
                    return;
                }
                Payload::Internal(children) => children,
            };
            depth += 1;
            let slot = child_index(color, depth);
            let next = children[slot];
            node_id = match next {
                Some(child_id) => child_id,
                None => {
                    let child_id = self.spawn(depth);
                    if let Payload::Internal(children) = &mut self.pool.get_mut(node_id).payload {
                        children[slot] = Some(child_id);
                    }
                    child_id
                }
            };
        }
    }

    /// Merges the children of `node_id` (at `depth`) into it, turning it into
    /// a leaf.
    fn fold(&mut self, node_id: NodeId, depth: u8) {
        let children = match &mut self.pool.get_mut(node_id).payload {
            Payload::Leaf(_) => return,
            Payload::Internal(children) => std::mem::take(children),
        };
        let mut leaf = Leaf::default();
        for child_id in children.into_iter().flatten() {
            if !self.pool.get(child_id).is_leaf() {
                self.fold(child_id, depth + 1);
            }
            self.registry.unlink(&mut self.pool, depth + 1, child_id);
            if let Payload::Leaf(child) = self.pool.release(child_id).payload {
                leaf.merge(&child);
            }
            self.leaf_count -= 1;
        }
        self.pool.get_mut(node_id).payload = Payload::Leaf(leaf);
        self.leaf_count += 1;
    }

    /// Folds levels 7 down to 1, least populated nodes first, until at most
    /// `max_colors` leaves remain. The root is never folded, so the result
    /// can still exceed `max_colors` when it is below the number of depth 1
    /// nodes.
    ///
    /// Fails only if the per-level work list cannot be allocated; the tree
    /// is left consistent in that case.
    pub fn reduce(&mut self, max_colors: usize) -> Result<()> {
        for depth in (1..MAX_DEPTH).rev() {
            let level = self.registry.level(depth);
            if level.is_empty() {
                continue;
            }
            let mut nodes = Vec::new();
            nodes.try_reserve_exact(level.len())?;
            nodes.extend(self.registry.iter(&self.pool, depth));
            nodes.sort_by_key(|&id| self.pool.get(id).population);
            debug!(
                "reduce: depth {depth}: {} nodes, {} leaves",
                nodes.len(),
                self.leaf_count
            );
            for node_id in nodes {
                if self.leaf_count <= max_colors {
                    return Ok(());
                }
                self.fold(node_id, depth);
            }
        }
        if self.leaf_count > max_colors {
            warn!(
                "reduce: {} colors left, requested at most {max_colors}",
                self.leaf_count
            );
        }
        Ok(())
    }

    /// Representative colors of all leaves, deepest level first.
    pub fn palette(&self) -> Vec<Color> {
        (1..=MAX_DEPTH)
            .rev()
            .flat_map(|depth| self.registry.iter(&self.pool, depth))
            .filter_map(|id| match &self.pool.get(id).payload {
                Payload::Leaf(leaf) => leaf.color(),
                Payload::Internal(_) => None,
            })
            .collect()
    }

    /// Releases every registered node and returns how many there were.
    pub fn teardown(mut self) -> usize {
        let mut released = 0;
        for depth in 1..=MAX_DEPTH {
            let ids: Vec<_> = self.registry.iter(&self.pool, depth).collect();
            for id in ids {
                self.registry.unlink(&mut self.pool, depth, id);
                self.pool.release(id);
                released += 1;
            }
        }
        released
    }
}

/// Builds a palette of at most `max_colors` (capped at 256) colors from
/// `pixels`.
pub fn adaptive_palette<I>(pixels: I, max_colors: usize) -> Result<Vec<Color>>
where
    I: IntoIterator<Item = Color>,
{
    let start_time = Instant::now();
    let max_colors = max_colors.min(MAX_PALETTE_COLORS);
    let mut tree = AdaptiveTree::new();
    pixels.into_iter().for_each(|p| tree.insert(p));
    let distinct = tree.leaf_count();
    tree.reduce(max_colors)?;
    let palette = tree.palette();
    let released = tree.teardown();
    info!(
        "Build color palette: {} of {distinct} colors, {released} nodes, {}ms",
        palette.len(),
        start_time.elapsed().as_millis()
    );
    Ok(palette)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color::{BLACK, WHITE};

    fn gradient() -> Vec<Color> {
        (0..64u32)
            .flat_map(|y| {
                (0..64u32).map(move |x| Rgb([(x * 4) as u8, (y * 4) as u8, ((x + y) * 2) as u8]))
            })
            .collect()
    }

    fn deep_leaves(tree: &AdaptiveTree) -> Vec<Leaf> {
        tree.registry
            .iter(&tree.pool, MAX_DEPTH)
            .filter_map(|id| match &tree.pool.get(id).payload {
                Payload::Leaf(leaf) => Some(*leaf),
                Payload::Internal(_) => None,
            })
            .collect()
    }

    #[test]
    fn insert_conserves_moments() {
        let pixels = gradient();
        let mut tree = AdaptiveTree::new();
        pixels.iter().for_each(|&p| tree.insert(p));

        let leaves = deep_leaves(&tree);
        assert_eq!(leaves.len(), tree.leaf_count());
        assert_eq!(tree.population(), pixels.len() as u64);
        assert_eq!(
            leaves.iter().map(|l| l.count).sum::<u64>(),
            pixels.len() as u64
        );
        for channel in 0..3 {
            assert_eq!(
                leaves.iter().map(|l| l.sums[channel]).sum::<u64>(),
                pixels.iter().map(|p| p[channel] as u64).sum::<u64>()
            );
        }
        // populations along every level add up to the pixel count
        for depth in 1..=MAX_DEPTH {
            let sum: u64 = tree
                .registry
                .iter(&tree.pool, depth)
                .map(|id| tree.pool.get(id).population)
                .sum();
            assert_eq!(sum, pixels.len() as u64);
        }
    }

    #[test]
    fn black_and_white() {
        let mut tree = AdaptiveTree::new();
        for i in 0..16 {
            tree.insert(if i % 2 == 0 { BLACK } else { WHITE });
        }
        assert!(tree.reduce(2).is_ok());
        assert_eq!(tree.leaf_count(), 2);
        let mut palette = tree.palette();
        palette.sort_by_key(|c| c.0);
        assert_eq!(palette, [BLACK, WHITE]);
    }

    #[test]
    fn reduce_averages_merged_colors() {
        let mut tree = AdaptiveTree::new();
        for r in [10, 20, 31] {
            tree.insert(Rgb([r, 0, 0]));
        }
        assert_eq!(tree.leaf_count(), 3);
        tree.reduce(1).unwrap();
        assert_eq!(tree.leaf_count(), 1);
        assert_eq!(tree.palette(), [Rgb([20, 0, 0])]);
    }

    #[test]
    fn reduce_meets_budget() {
        let mut tree = AdaptiveTree::new();
        gradient().into_iter().for_each(|p| tree.insert(p));
        assert!(tree.leaf_count() > 16);
        tree.reduce(16).unwrap();
        assert!(tree.leaf_count() <= 16);
        assert_eq!(tree.palette().len(), tree.leaf_count());
        assert_eq!(tree.population(), 64 * 64);
    }

    #[test]
    fn reduce_below_first_level() {
        let mut tree = AdaptiveTree::new();
        tree.insert(BLACK);
        tree.insert(WHITE);
        tree.insert(Rgb([255, 0, 0]));
        assert_eq!(tree.level_len(1), 3);
        assert!(tree.reduce(1).is_ok());
        assert_eq!(tree.leaf_count(), 3);
        assert_eq!(tree.level_len(2), 0);
        let mut palette = tree.palette();
        palette.sort_by_key(|c| c.0);
        assert_eq!(palette, [BLACK, Rgb([255, 0, 0]), WHITE]);
    }

    #[test]
    fn folding_never_adds_leaves() {
        let mut tree = AdaptiveTree::new();
        gradient().into_iter().for_each(|p| tree.insert(p));
        for depth in (1..MAX_DEPTH).rev() {
            let ids: Vec<_> = tree.registry.iter(&tree.pool, depth).collect();
            for id in ids {
                let before = tree.leaf_count();
                tree.fold(id, depth);
                assert!(tree.leaf_count() <= before);
            }
        }
        assert_eq!(tree.leaf_count(), tree.level_len(1));
    }

    #[test]
    fn reduce_is_repeatable() {
        let mut tree = AdaptiveTree::new();
        gradient().into_iter().for_each(|p| tree.insert(p));
        let mut last = tree.leaf_count();
        for max_colors in [200, 64, 17, 5] {
            tree.reduce(max_colors).unwrap();
            assert!(tree.leaf_count() <= last);
            assert!(tree.leaf_count() <= max_colors.max(tree.level_len(1)));
            last = tree.leaf_count();
        }
    }

    #[test]
    fn insert_into_reduced_tree() {
        let mut tree = AdaptiveTree::new();
        tree.insert(Rgb([10, 0, 0]));
        tree.insert(Rgb([20, 0, 0]));
        tree.reduce(1).unwrap();
        tree.insert(Rgb([30, 0, 0]));
        assert_eq!(tree.leaf_count(), 1);
        assert_eq!(tree.population(), 3);
        assert_eq!(tree.palette(), [Rgb([20, 0, 0])]);
    }

    #[test]
    fn teardown_releases_every_node() {
        let mut tree = AdaptiveTree::new();
        gradient().into_iter().for_each(|p| tree.insert(p));
        tree.reduce(32).unwrap();
        let registered: usize = (1..=MAX_DEPTH).map(|d| tree.level_len(d)).sum();
        assert_eq!(registered, tree.pool.live() - 1);
        assert_eq!(tree.teardown(), registered);
    }

    #[test]
    fn empty_tree() {
        let mut tree = AdaptiveTree::new();
        assert!(tree.reduce(4).is_ok());
        assert!(tree.palette().is_empty());
        assert_eq!(tree.teardown(), 0);
    }

    #[test]
    fn palette_from_pixels() {
        let palette = adaptive_palette(gradient(), 8).unwrap();
        assert!(!palette.is_empty());
        assert!(palette.len() <= 8);
        let palette = adaptive_palette([BLACK, BLACK, WHITE], 1000).unwrap();
        assert_eq!(palette.len(), 2);
    }
}
