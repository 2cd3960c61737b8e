//! Bounding Volume Hierarchy over primitive bounds.
//!
//! Median split on the longest centroid axis, flattened into one node array.
//! The BVH knows nothing about the primitives themselves: traversal hands
//! primitive indices to a caller-supplied closure.

use glint_math::{Aabb, Ray};

/// Maximum primitives per leaf node before splitting.
const LEAF_MAX_SIZE: usize = 4;

/// Traversal stack depth. Median splits keep the tree balanced, so this
/// covers far more primitives than fit in memory.
const STACK_SIZE: usize = 64;

#[derive(Debug, Clone, Copy)]
struct BvhNode {
    bounds: Aabb,
    /// First primitive of a leaf, or the left child of a branch
    first: u32,
    /// Primitive count; zero marks a branch whose children are `first` and
    /// `first + 1`
    count: u32,
}

impl BvhNode {
    #[inline]
    fn is_leaf(&self) -> bool {
        self.count > 0
    }
}

#[derive(Debug, Clone, Default)]
pub struct Bvh {
    nodes: Vec<BvhNode>,
    /// Primitive indices, reordered so each leaf owns a contiguous range
    indices: Vec<u32>,
}

impl Bvh {
    /// Build over one bounding box per primitive.
    pub fn build(bounds: &[Aabb]) -> Self {
        if bounds.is_empty() {
            return Self::default();
        }

        let centroids: Vec<_> = bounds.iter().map(Aabb::centroid).collect();
        let mut bvh = Self {
            nodes: Vec::with_capacity(2 * bounds.len()),
            indices: (0..bounds.len() as u32).collect(),
        };

        bvh.nodes.push(BvhNode {
            bounds: Aabb::EMPTY,
            first: 0,
            count: 0,
        });
        bvh.subdivide(0, 0, bounds.len(), bounds, &centroids);
        bvh
    }

    /// Recursive construction: sort the range by centroid on the longest
    /// axis, split in half, recurse.
    fn subdivide(
        &mut self,
        node: usize,
        first: usize,
        count: usize,
        bounds: &[Aabb],
        centroids: &[glint_math::Vec3],
    ) {
        let range = first..first + count;
        let node_bounds = self.indices[range.clone()]
            .iter()
            .fold(Aabb::EMPTY, |acc, &i| Aabb::surrounding(&acc, &bounds[i as usize]));
        self.nodes[node].bounds = node_bounds;

        if count <= LEAF_MAX_SIZE {
            self.nodes[node].first = first as u32;
            self.nodes[node].count = count as u32;
            return;
        }

        let centroid_bounds = self.indices[range.clone()]
            .iter()
            .fold(Aabb::EMPTY, |mut acc, &i| {
                acc.grow(centroids[i as usize]);
                acc
            });
        let axis = centroid_bounds.longest_axis();

        self.indices[range].sort_unstable_by(|&a, &b| {
            centroids[a as usize][axis]
                .partial_cmp(&centroids[b as usize][axis])
                .unwrap_or(std::cmp::Ordering::Equal)
        });

        let mid = count / 2;
        let left = self.nodes.len();
        let empty = BvhNode {
            bounds: Aabb::EMPTY,
            first: 0,
            count: 0,
        };
        self.nodes.push(empty);
        self.nodes.push(empty);
        self.nodes[node].first = left as u32;
        self.nodes[node].count = 0;

        self.subdivide(left, first, mid, bounds, centroids);
        self.subdivide(left + 1, first + mid, count - mid, bounds, centroids);
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Closest-hit traversal. `visit(prim, t_max)` tests one primitive and
    /// returns its distance if it is hit closer than `t_max`.
    ///
    /// Returns the closest primitive and its distance.
    pub fn closest_hit<F>(&self, ray: &Ray, t_max: f32, mut visit: F) -> Option<(u32, f32)>
    where
        F: FnMut(u32, f32) -> Option<f32>,
    {
        let mut closest = None;
        self.traverse(ray, t_max, |prims, mut bound| {
            for &prim in prims {
                if let Some(t) = visit(prim, bound) {
                    if t < bound {
                        bound = t;
                        closest = Some((prim, t));
                    }
                }
            }
            (false, bound)
        });
        closest
    }

    /// Any-hit traversal, stops at the first primitive `test` accepts.
    pub fn any_hit<F>(&self, ray: &Ray, t_max: f32, mut test: F) -> bool
    where
        F: FnMut(u32) -> bool,
    {
        let mut found = false;
        self.traverse(ray, t_max, |prims, bound| {
            found = prims.iter().any(|&prim| test(prim));
            (found, bound)
        });
        found
    }

    /// Walk the nodes the ray enters, nearer child first. `leaf` receives a
    /// leaf's primitives and the current distance bound, and returns whether
    /// to stop plus the (possibly tightened) bound.
    fn traverse<F>(&self, ray: &Ray, t_max: f32, mut leaf: F)
    where
        F: FnMut(&[u32], f32) -> (bool, f32),
    {
        let Some(root) = self.nodes.first() else {
            return;
        };
        if root.bounds.intersect(ray, t_max).is_none() {
            return;
        }

        let mut t_max = t_max;
        let mut stack = [0u32; STACK_SIZE];
        let mut top = 1;

        while top > 0 {
            top -= 1;
            let node = &self.nodes[stack[top] as usize];

            if node.is_leaf() {
                let start = node.first as usize;
                let prims = &self.indices[start..start + node.count as usize];
                let (stop, bound) = leaf(prims, t_max);
                if stop {
                    return;
                }
                t_max = bound;
                continue;
            }

            let left = node.first;
            let right = node.first + 1;
            let t_left = self.nodes[left as usize].bounds.intersect(ray, t_max);
            let t_right = self.nodes[right as usize].bounds.intersect(ray, t_max);

            // Push the farther child first so the nearer one is popped next
            match (t_left, t_right) {
                (Some(tl), Some(tr)) => {
                    let (near, far) = if tl <= tr { (left, right) } else { (right, left) };
                    if top + 2 <= STACK_SIZE {
                        stack[top] = far;
                        stack[top + 1] = near;
                        top += 2;
                    }
                }
                (Some(_), None) => {
                    stack[top] = left;
                    top += 1;
                }
                (None, Some(_)) => {
                    stack[top] = right;
                    top += 1;
                }
                (None, None) => {}
            }
        }
    }
}
