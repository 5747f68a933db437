//! Target tree sink.
//!
//! The replay engine never owns the rendered tree. It drives a [`TreeSink`],
//! which creates nodes, attaches and detaches them, and carries the node-id
//! back-reference used by the engine's identity map.
//!
//! Invariants a sink must uphold:
//! - Inserting a fragment node moves all of the fragment's children, in order,
//!   and leaves the fragment empty (DOM `DocumentFragment` semantics).
//! - Inserting a node that already has a parent moves it.
//! - `set_node_id` is the only writer of the id back-reference; moving a node
//!   (including through a fragment) never changes it.
//! - Once [`TreeSink::is_alive`] returns false every fallible operation returns
//!   [`SinkError::Destroyed`].

mod arena;

pub use crate::arena::{ArenaNode, ArenaSink, VisualEffect};

use core_types::NodeId;
use snapshot::{MediaInteraction, MouseInteraction};
use std::fmt::Debug;
use std::hash::Hash;
use thiserror::Error;

#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum SinkError {
    #[error("sink has been destroyed")]
    Destroyed,
    #[error("unknown node handle")]
    UnknownNode,
    #[error("operation requires a {expected} node")]
    WrongNodeKind { expected: &'static str },
    #[error("node cannot have children")]
    InvalidParent,
    #[error("node is not a child of the given parent")]
    NotAChild,
    #[error("reference sibling is not a child of the given parent")]
    InvalidSibling,
    #[error("insertion would create a cycle")]
    CycleDetected,
    #[error("invalid attribute name {0:?}")]
    InvalidAttribute(String),
    #[error("node is not connected to the rendered document")]
    Detached,
    #[error("rule index {0} out of range")]
    RuleIndexOutOfRange(usize),
}

/// Out-of-band layout directives carried by reserved attributes.
#[derive(Clone, Debug, PartialEq)]
pub enum LayoutHint {
    Width(String),
    Height(String),
    ScrollLeft(f64),
    ScrollTop(f64),
}

pub trait TreeSink {
    type Node: Copy + Eq + Hash + Debug;

    fn is_alive(&self) -> bool;

    fn create_document(&mut self) -> Result<Self::Node, SinkError>;
    fn create_doctype(
        &mut self,
        name: &str,
        public_id: &str,
        system_id: &str,
    ) -> Result<Self::Node, SinkError>;
    fn create_element(&mut self, tag: &str) -> Result<Self::Node, SinkError>;
    fn create_text(&mut self, text: &str) -> Result<Self::Node, SinkError>;
    /// Detached staging container, see the module invariants.
    fn create_fragment(&mut self) -> Result<Self::Node, SinkError>;

    /// Make `document` the rendered root, replacing the previous one.
    fn set_root(&mut self, document: Self::Node) -> Result<(), SinkError>;
    fn root(&self) -> Option<Self::Node>;
    /// Content document of an embedded container, `None` while it is not
    /// initialized yet.
    fn content_document(&mut self, container: Self::Node) -> Option<Self::Node>;
    /// Content document of `container` if it was already handed out by
    /// `content_document`. Never initializes anything.
    fn embedded_document(&self, _container: Self::Node) -> Option<Self::Node> {
        None
    }

    /// Insert `child` into `parent` before `before`, or at the end.
    fn insert_before(
        &mut self,
        parent: Self::Node,
        child: Self::Node,
        before: Option<Self::Node>,
    ) -> Result<(), SinkError>;
    fn append_child(&mut self, parent: Self::Node, child: Self::Node) -> Result<(), SinkError> {
        self.insert_before(parent, child, None)
    }
    fn remove_child(&mut self, parent: Self::Node, child: Self::Node) -> Result<(), SinkError>;

    fn parent(&self, node: Self::Node) -> Option<Self::Node>;
    fn children(&self, node: Self::Node) -> Vec<Self::Node>;
    fn first_child(&self, node: Self::Node) -> Option<Self::Node> {
        self.children(node).first().copied()
    }
    fn next_sibling(&self, node: Self::Node) -> Option<Self::Node>;
    /// Inclusive: a node contains itself.
    fn contains(&self, ancestor: Self::Node, node: Self::Node) -> bool;
    /// Reachable from the rendered root, through embedded documents too.
    fn is_connected(&self, node: Self::Node) -> bool;
    fn is_element(&self, node: Self::Node) -> bool;

    fn set_attribute(&mut self, node: Self::Node, name: &str, value: &str)
    -> Result<(), SinkError>;
    fn remove_attribute(&mut self, node: Self::Node, name: &str) -> Result<(), SinkError>;
    fn set_text(&mut self, node: Self::Node, text: Option<&str>) -> Result<(), SinkError>;
    fn apply_hint(&mut self, node: Self::Node, hint: &LayoutHint) -> Result<(), SinkError>;

    fn node_id(&self, node: Self::Node) -> Option<NodeId>;
    fn set_node_id(&mut self, node: Self::Node, id: Option<NodeId>);

    fn scroll_position(&self, node: Self::Node) -> Option<(f64, f64)>;
    fn set_scroll(&mut self, node: Self::Node, x: f64, y: f64) -> Result<(), SinkError>;
    fn set_input_value(
        &mut self,
        node: Self::Node,
        text: &str,
        checked: bool,
    ) -> Result<(), SinkError>;

    // Visual capabilities. Sinks without a pointer overlay or stylesheet
    // object model can ignore them.

    fn move_pointer(&mut self, _x: f64, _y: f64) {}
    fn hover(&mut self, _target: Self::Node) {}
    fn click_pulse(&mut self) {}
    fn dispatch_interaction(&mut self, _target: Self::Node, _kind: MouseInteraction) {}
    fn media(&mut self, _target: Self::Node, _action: MediaInteraction) -> Result<(), SinkError> {
        Ok(())
    }
    fn insert_style_rule(
        &mut self,
        _target: Self::Node,
        _rule: &str,
        _index: Option<usize>,
    ) -> Result<(), SinkError> {
        Ok(())
    }
    fn delete_style_rule(&mut self, _target: Self::Node, _index: usize) -> Result<(), SinkError> {
        Ok(())
    }
    fn set_selection(
        &mut self,
        _anchor: Self::Node,
        _anchor_offset: i64,
        _focus: Self::Node,
        _focus_offset: i64,
    ) -> Result<(), SinkError> {
        Ok(())
    }
    /// Number of external stylesheets the rendered document still waits for.
    fn pending_stylesheets(&self) -> usize {
        0
    }
    fn set_paused(&mut self, _paused: bool) {}
}
