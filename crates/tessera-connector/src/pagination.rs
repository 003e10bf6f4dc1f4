//! Resumable pagination cursors.
//!
//! A listing that walks a tree of resources keeps a stack of frames, one per
//! level being paged. The whole stack travels between calls as a single
//! opaque token: URL-safe, unpadded base64 of the JSON frame list. An empty
//! token means "start at the root frame"; an empty stack encodes to the empty
//! token, which the sync driver reads as "no more pages".

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use serde::{Deserialize, Serialize};

use crate::error::{ConnectorError, ConnectorResult};

/// One level of an in-progress listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageFrame {
    /// Resource type being paged at this level.
    pub resource_type_id: String,

    /// Resource the level is scoped to, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resource_id: Option<String>,

    /// Backend page offset.
    #[serde(default)]
    pub offset: u64,
}

impl PageFrame {
    /// Frame at offset zero for a resource type.
    pub fn new(resource_type_id: impl Into<String>) -> Self {
        Self {
            resource_type_id: resource_type_id.into(),
            resource_id: None,
            offset: 0,
        }
    }

    /// Scope the frame to a resource.
    pub fn with_resource_id(mut self, resource_id: impl Into<String>) -> Self {
        self.resource_id = Some(resource_id.into());
        self
    }

    pub fn with_offset(mut self, offset: u64) -> Self {
        self.offset = offset;
        self
    }
}

/// Stack of pagination frames.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PageBag {
    frames: Vec<PageFrame>,
}

impl PageBag {
    /// Stack holding just the given frame.
    pub fn new(root: PageFrame) -> Self {
        Self { frames: vec![root] }
    }

    /// Decode a token, seeding the stack with `root` when the token is empty.
    pub fn decode(token: &str, root: PageFrame) -> ConnectorResult<Self> {
        if token.is_empty() {
            return Ok(Self::new(root));
        }

        let bytes = URL_SAFE_NO_PAD
            .decode(token)
            .map_err(|e| ConnectorError::invalid_cursor(format!("bad base64: {e}")))?;
        let frames: Vec<PageFrame> = serde_json::from_slice(&bytes)
            .map_err(|e| ConnectorError::invalid_cursor(format!("bad frame list: {e}")))?;

        if frames.is_empty() {
            return Err(ConnectorError::invalid_cursor("token holds no frames"));
        }

        Ok(Self { frames })
    }

    /// Encode the stack; an empty stack yields the empty token.
    pub fn encode(&self) -> ConnectorResult<String> {
        if self.frames.is_empty() {
            return Ok(String::new());
        }

        let json = serde_json::to_vec(&self.frames)
            .map_err(|e| ConnectorError::internal(format!("failed to encode page token: {e}")))?;
        Ok(URL_SAFE_NO_PAD.encode(json))
    }

    pub fn push(&mut self, frame: PageFrame) {
        self.frames.push(frame);
    }

    pub fn pop(&mut self) -> Option<PageFrame> {
        self.frames.pop()
    }

    /// Innermost frame.
    pub fn current(&self) -> Option<&PageFrame> {
        self.frames.last()
    }

    /// Offset of the innermost frame, zero when the stack is empty.
    pub fn current_offset(&self) -> u64 {
        self.current().map_or(0, |frame| frame.offset)
    }

    pub fn frames(&self) -> &[PageFrame] {
        &self.frames
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    /// Advance the innermost frame and encode the result.
    ///
    /// `Some(offset)` moves the current frame to that offset. `None` means the
    /// backend is exhausted at this level, so the frame is popped.
    pub fn next_token(&mut self, next_offset: Option<u64>) -> ConnectorResult<String> {
        match next_offset {
            Some(offset) => {
                if let Some(frame) = self.frames.last_mut() {
                    frame.offset = offset;
                }
            }
            None => {
                self.frames.pop();
            }
        }
        self.encode()
    }
}
