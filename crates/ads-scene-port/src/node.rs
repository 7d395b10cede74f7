// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Minimal transform hierarchy used to size spatial placements.

use std::cell::RefCell;
use std::rc::Rc;

#[derive(Debug)]
struct NodeState {
    scale: [f64; 3],
    parent: Option<SceneNode>,
}

/// Shared handle to a node in the host's transform hierarchy.
///
/// Only scale matters for sizing. Hosts keep a clone and update it when the
/// prop is rescaled; placements read the combined scale on demand.
#[derive(Debug, Clone)]
pub struct SceneNode(Rc<RefCell<NodeState>>);

impl SceneNode {
    /// A root node with the given local scale.
    pub fn new(scale: [f64; 3]) -> Self {
        Self(Rc::new(RefCell::new(NodeState {
            scale,
            parent: None,
        })))
    }

    /// A node with the given local scale, parented under `parent`.
    pub fn child_of(parent: &Self, scale: [f64; 3]) -> Self {
        let node = Self::new(scale);
        node.0.borrow_mut().parent = Some(parent.clone());
        node
    }

    /// Local scale.
    pub fn scale(&self) -> [f64; 3] {
        self.0.borrow().scale
    }

    /// Replace the local scale.
    pub fn set_scale(&self, scale: [f64; 3]) {
        self.0.borrow_mut().scale = scale;
    }

    /// Re-parent this node (or detach it with `None`).
    ///
    /// Returns `false` and leaves the hierarchy untouched when `parent` is
    /// this node or one of its descendants.
    #[must_use]
    pub fn set_parent(&self, parent: Option<&Self>) -> bool {
        if parent.is_some_and(|p| p.has_ancestor_or_self(self)) {
            return false;
        }
        self.0.borrow_mut().parent = parent.cloned();
        true
    }

    fn has_ancestor_or_self(&self, node: &Self) -> bool {
        let mut current = Some(self.clone());
        while let Some(candidate) = current {
            if Rc::ptr_eq(&candidate.0, &node.0) {
                return true;
            }
            current = candidate.0.borrow().parent.clone();
        }
        false
    }

    /// Local scale multiplied by every ancestor's scale.
    pub fn combined_scale(&self) -> [f64; 3] {
        let mut scale = self.scale();
        let mut current = self.0.borrow().parent.clone();
        while let Some(node) = current {
            let state = node.0.borrow();
            for (axis, parent_axis) in scale.iter_mut().zip(state.scale) {
                *axis *= parent_axis;
            }
            current = state.parent.clone();
        }
        scale
    }
}
