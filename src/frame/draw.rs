use std::sync::Arc;

use crate::{
    foundation::error::MixResult,
    frame::write::{FrameTransform, WriteFrame},
};

/// Receives the leaves of a [`DrawFrame`] tree in paint order.
///
/// `begin`/`end` bracket every node so visitors can keep a transform stack.
pub trait FrameVisitor {
    fn begin(&mut self, transform: &FrameTransform);
    fn visit(&mut self, frame: &Arc<WriteFrame>) -> MixResult<()>;
    fn end(&mut self);
}

/// Content of one layer: nothing, a single producer frame, or a transformed group.
#[derive(Clone, Debug, Default)]
pub enum DrawFrame {
    #[default]
    Empty,
    Frame(Arc<WriteFrame>),
    Group {
        transform: FrameTransform,
        children: Vec<DrawFrame>,
    },
}

impl DrawFrame {
    pub fn new(frame: WriteFrame) -> Self {
        Self::Frame(Arc::new(frame))
    }

    pub fn group(children: Vec<DrawFrame>) -> Self {
        Self::Group {
            transform: FrameTransform::default(),
            children,
        }
    }

    /// Wrap `self` in a group carrying `transform`.
    pub fn with_transform(self, transform: FrameTransform) -> Self {
        Self::Group {
            transform,
            children: vec![self],
        }
    }

    pub fn is_empty(&self) -> bool {
        match self {
            Self::Empty => true,
            Self::Frame(_) => false,
            Self::Group { children, .. } => children.iter().all(DrawFrame::is_empty),
        }
    }

    /// Walk the tree depth-first, children in order.
    pub fn accept(&self, visitor: &mut dyn FrameVisitor) -> MixResult<()> {
        match self {
            Self::Empty => Ok(()),
            Self::Frame(frame) => {
                visitor.begin(frame.transform());
                let res = visitor.visit(frame);
                visitor.end();
                res
            }
            Self::Group {
                transform,
                children,
            } => {
                visitor.begin(transform);
                let res = children.iter().try_for_each(|child| child.accept(visitor));
                visitor.end();
                res
            }
        }
    }
}

impl From<WriteFrame> for DrawFrame {
    fn from(frame: WriteFrame) -> Self {
        Self::new(frame)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/frame/draw.rs"]
mod tests;
