//! SAH kd-tree acceleration structure over scene triangles.
//!
//! The build phase recursively partitions triangle bounding volumes with a
//! surface-area-heuristic cost sweep over candidate split planes; traversal
//! is a stack-driven front-to-back walk that prunes nodes once a closer hit
//! is known.

use std::cmp::Ordering;

use glint_math::{Extent3, Ray};

use crate::intersect::{intersect_triangle, SurfaceInteraction};
use crate::scene::{Scene, Triangle};

/// kd-tree build configuration.
#[derive(Debug, Clone)]
pub struct BuildOptions {
    /// Maximum depth of the tree. 0 derives the depth from the primitive
    /// count as `8 + floor(1.3 * log2(n))`.
    pub max_depth: usize,
    /// Maximum number of primitives in a leaf before the builder stops
    /// splitting.
    pub max_primitives: usize,
    /// The cost to intersect a primitive.
    pub intersect_cost: f32,
    /// The cost to traverse an interior node.
    pub traverse_cost: f32,
    /// The bonus for cutting off an empty child. Must be in range [0, 1].
    pub empty_bonus: f32,
}

impl Default for BuildOptions {
    fn default() -> Self {
        Self {
            max_depth: 0,
            max_primitives: 1,
            intersect_cost: 80.0,
            traverse_cost: 1.0,
            empty_bonus: 0.5,
        }
    }
}

/// Tree node. The first child of an interior node is the next record in the
/// node array; only the second child's index is stored.
#[derive(Debug, Clone, Copy, PartialEq)]
enum KdNode {
    Interior {
        /// Split axis: 0 (x), 1 (y) or 2 (z)
        axis: u8,
        /// Position of the split along the axis in world space
        split: f32,
        /// Index of the second child in the node array
        second_child: u32,
    },
    Leaf {
        /// Offset of the leaf's payload in `primitive_indices`
        offset: u32,
        /// Number of primitive indices in the payload
        count: u32,
    },
}

/// A split candidate: one side of a primitive's bounding volume projected
/// onto the sweep axis.
#[derive(Debug, Clone, Copy)]
struct Edge {
    primitive: u32,
    position: f32,
    /// Whether this is the minimum or the maximum edge of the volume
    is_min: bool,
}

/// SAH kd-tree over the triangles of a scene.
///
/// The tree stores triangle indices; it borrows the scene's triangle array
/// during intersection queries, so mutating the triangle set invalidates
/// the tree.
#[derive(Debug)]
pub struct KdTree {
    /// Bounding volumes of the primitives, parallel to `scene.triangles`
    primitive_bv: Vec<Extent3>,
    /// Nodes in build order; the root is node 0
    nodes: Vec<KdNode>,
    /// Concatenated leaf payloads
    primitive_indices: Vec<u32>,
    /// Union of all primitive bounding volumes
    root_bounds: Extent3,
    /// Depth bound the tree was built with, sizes the traversal stack
    max_depth: usize,
}

fn triangle_bounds(triangle: &Triangle) -> Extent3 {
    Extent3::new(
        triangle.v1.min(triangle.v2).min(triangle.v3),
        triangle.v1.max(triangle.v2).max(triangle.v3),
    )
}

fn auto_max_depth(primitives: usize) -> usize {
    // 8 + 1.3 * log2(primitives), in integer arithmetic
    8 + (13 * primitives.max(1).ilog2() as usize) / 10
}

impl KdTree {
    /// Build a tree over the scene's triangles.
    pub fn build(scene: &Scene, options: &BuildOptions) -> KdTree {
        let primitives = scene.triangles.len();
        let mut primitive_bv = Vec::with_capacity(primitives);
        let mut root_bounds = Extent3::EMPTY;
        for triangle in &scene.triangles {
            let bounds = triangle_bounds(triangle);
            root_bounds = Extent3::union(&root_bounds, &bounds);
            primitive_bv.push(bounds);
        }

        let max_depth = if options.max_depth == 0 {
            auto_max_depth(primitives)
        } else {
            options.max_depth
        };

        let mut tree = KdTree {
            primitive_bv,
            nodes: Vec::new(),
            primitive_indices: Vec::new(),
            root_bounds,
            max_depth,
        };

        // Working memory for the split sweep, one edge list per axis,
        // reused across the whole recursion.
        let mut edges: [Vec<Edge>; 3] = [
            Vec::with_capacity(2 * primitives),
            Vec::with_capacity(2 * primitives),
            Vec::with_capacity(2 * primitives),
        ];
        let indices: Vec<u32> = (0..primitives as u32).collect();
        tree.construct_node(&indices, root_bounds, max_depth, 0, &mut edges, options);

        log::debug!(
            "kd-tree built: {} triangles, {} nodes, {} leaf indices, depth limit {}",
            primitives,
            tree.nodes.len(),
            tree.primitive_indices.len(),
            max_depth
        );
        tree
    }

    /// Bounds of the whole tree.
    pub fn root_bounds(&self) -> Extent3 {
        self.root_bounds
    }

    fn initialize_leaf(&mut self, node_index: usize, prims: &[u32]) {
        let offset = self.primitive_indices.len() as u32;
        self.primitive_indices.extend_from_slice(prims);
        self.nodes[node_index] = KdNode::Leaf {
            offset,
            count: prims.len() as u32,
        };
    }

    fn construct_node(
        &mut self,
        prims: &[u32],
        bounds: Extent3,
        depth: usize,
        bad_refines: u32,
        edges: &mut [Vec<Edge>; 3],
        options: &BuildOptions,
    ) {
        // Reserve this node's slot; interior nodes are patched once the
        // index of the second child is known.
        let node_index = self.nodes.len();
        self.nodes.push(KdNode::Leaf { offset: 0, count: 0 });

        if prims.len() <= options.max_primitives || depth == 0 {
            self.initialize_leaf(node_index, prims);
            return;
        }

        // Sweep the candidate split planes of up to three axes, starting
        // from the widest one, and keep the cheapest split.
        let mut best_cost = f32::INFINITY;
        let mut best_split: Option<(usize, usize)> = None;
        let inv_area = 1.0 / bounds.surface_area();
        let diagonal = bounds.diagonal();
        let mut axis = bounds.longest_axis();
        for _retry in 0..3 {
            let edge_list = &mut edges[axis];
            edge_list.clear();
            for &prim in prims {
                let bv = &self.primitive_bv[prim as usize];
                edge_list.push(Edge {
                    primitive: prim,
                    position: bv.min[axis],
                    is_min: true,
                });
                edge_list.push(Edge {
                    primitive: prim,
                    position: bv.max[axis],
                    is_min: false,
                });
            }
            // Stable sort: position ascending, min edges before max edges at
            // equal positions.
            edge_list.sort_by(|a, b| {
                a.position
                    .partial_cmp(&b.position)
                    .unwrap_or(Ordering::Equal)
                    .then(b.is_min.cmp(&a.is_min))
            });

            // Sweep left to right. A primitive leaves the `above` set at its
            // max edge before the split is scored and joins the `below` set
            // at its min edge after.
            let mut below = 0usize;
            let mut above = prims.len();
            for (i, edge) in edge_list.iter().enumerate() {
                if !edge.is_min {
                    above -= 1;
                }

                let split = edge.position;
                if split > bounds.min[axis] && split < bounds.max[axis] {
                    let other0 = (axis + 1) % 3;
                    let other1 = (axis + 2) % 3;
                    let cross_section = diagonal[other0] * diagonal[other1];
                    let rim = diagonal[other0] + diagonal[other1];
                    let below_area =
                        2.0 * (cross_section + (split - bounds.min[axis]) * rim);
                    let above_area =
                        2.0 * (cross_section + (bounds.max[axis] - split) * rim);
                    let probability_below = below_area * inv_area;
                    let probability_above = above_area * inv_area;
                    let bonus = if above == 0 || below == 0 {
                        options.empty_bonus
                    } else {
                        0.0
                    };
                    let cost = options.traverse_cost
                        + options.intersect_cost
                            * (1.0 - bonus)
                            * (probability_below * below as f32
                                + probability_above * above as f32);
                    if cost < best_cost {
                        best_cost = cost;
                        best_split = Some((axis, i));
                    }
                }

                if edge.is_min {
                    below += 1;
                }
            }

            if best_split.is_some() {
                break;
            }
            axis = (axis + 1) % 3;
        }

        let leaf_cost = options.intersect_cost * prims.len() as f32;
        let mut bad_refines = bad_refines;
        if best_cost > leaf_cost {
            bad_refines += 1;
        }

        let refuse_split = best_cost > 4.0 * leaf_cost && prims.len() < 16;
        let (best_axis, best_offset) = match best_split {
            Some(split) if !refuse_split && bad_refines != 3 => split,
            _ => {
                self.initialize_leaf(node_index, prims);
                return;
            }
        };

        // Partition by edge order around the chosen split plane. A primitive
        // whose volume straddles the plane ends up on both sides.
        let edge_list = &edges[best_axis];
        let split_position = edge_list[best_offset].position;
        let mut below_prims = Vec::with_capacity(prims.len());
        for edge in &edge_list[..best_offset] {
            if edge.is_min {
                below_prims.push(edge.primitive);
            }
        }
        let mut above_prims = Vec::with_capacity(prims.len());
        for edge in &edge_list[best_offset + 1..] {
            if !edge.is_min {
                above_prims.push(edge.primitive);
            }
        }

        let mut below_bounds = bounds;
        below_bounds.max[best_axis] = split_position;
        self.construct_node(
            &below_prims,
            below_bounds,
            depth - 1,
            bad_refines,
            edges,
            options,
        );

        let second_child = self.nodes.len() as u32;
        self.nodes[node_index] = KdNode::Interior {
            axis: best_axis as u8,
            split: split_position,
            second_child,
        };

        let mut above_bounds = bounds;
        above_bounds.min[best_axis] = split_position;
        self.construct_node(
            &above_prims,
            above_bounds,
            depth - 1,
            bad_refines,
            edges,
            options,
        );
    }

    /// Find the nearest triangle hit along a ray.
    ///
    /// Equivalent to a linear scan over all of the scene's triangles up to
    /// floating point, but only visits nodes that can still contain a
    /// closer hit.
    pub fn intersect(&self, scene: &Scene, ray: &Ray) -> Option<SurfaceInteraction> {
        self.intersect_counted(scene, ray, &mut 0)
    }

    /// Traversal core; `tested` counts primitive intersection tests.
    fn intersect_counted(
        &self,
        scene: &Scene,
        ray: &Ray,
        tested: &mut u64,
    ) -> Option<SurfaceInteraction> {
        let inv_direction = ray.direction().recip();
        let (t_enter, t_exit) = self.root_bounds.intersect(ray.origin(), inv_direction)?;

        let mut best: Option<SurfaceInteraction> = None;
        let mut best_t = f32::INFINITY;
        let mut stack: Vec<(u32, f32, f32)> = Vec::with_capacity(2 * self.max_depth + 2);
        stack.push((0, t_enter, t_exit));
        while let Some(&(node_index, t_min, t_max)) = stack.last() {
            // No node further down the stack can contain a closer hit.
            if t_min > best_t {
                break;
            }
            stack.pop();

            match self.nodes[node_index as usize] {
                KdNode::Interior {
                    axis,
                    split,
                    second_child,
                } => {
                    let axis = axis as usize;
                    let below_first = ray.origin()[axis] < split
                        || (ray.origin()[axis] == split && ray.direction()[axis] <= 0.0);
                    let (first, second) = if below_first {
                        (node_index + 1, second_child)
                    } else {
                        (second_child, node_index + 1)
                    };

                    let t_split = (split - ray.origin()[axis]) * inv_direction[axis];
                    if t_split > t_max || t_split <= 0.0 {
                        stack.push((first, t_min, t_max));
                    } else if t_split < t_min {
                        stack.push((second, t_min, t_max));
                    } else {
                        // The near child is pushed last so it is resolved
                        // before the far one.
                        stack.push((second, t_split, t_max));
                        stack.push((first, t_min, t_split));
                    }
                }
                KdNode::Leaf { offset, count } => {
                    let indices =
                        &self.primitive_indices[offset as usize..(offset + count) as usize];
                    for &index in indices {
                        *tested += 1;
                        let triangle = &scene.triangles[index as usize];
                        if let Some(interaction) = intersect_triangle(ray, triangle) {
                            if interaction.distance < best_t {
                                best_t = interaction.distance;
                                best = Some(interaction);
                            }
                        }
                    }
                }
            }
        }

        best
    }
}
