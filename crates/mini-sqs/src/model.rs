//! Request and response shapes for the SQS JSON protocol.
//!
//! Field names follow the service's PascalCase wire format. Optional fields are
//! omitted from the serialized body when absent so the bytes sent match exactly
//! what the caller populated.

use crate::batch::BatchEntry;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

#[cfg(test)]
#[path = "model_tests.rs"]
mod tests;

// ============================================================================
// Operation Targets
// ============================================================================

/// Operations this client issues, sent as `X-Amz-Target: AmazonSQS.<name>`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Target {
    SendMessage,
    SendMessageBatch,
    DeleteMessage,
    DeleteMessageBatch,
    ReceiveMessage,
    ChangeMessageVisibility,
    ChangeMessageVisibilityBatch,
}

impl Target {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::SendMessage => "SendMessage",
            Self::SendMessageBatch => "SendMessageBatch",
            Self::DeleteMessage => "DeleteMessage",
            Self::DeleteMessageBatch => "DeleteMessageBatch",
            Self::ReceiveMessage => "ReceiveMessage",
            Self::ChangeMessageVisibility => "ChangeMessageVisibility",
            Self::ChangeMessageVisibilityBatch => "ChangeMessageVisibilityBatch",
        }
    }

    /// Value of the `X-Amz-Target` header for this operation
    pub fn header_value(&self) -> String {
        format!("AmazonSQS.{}", self.as_str())
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Well-known names accepted in [`ReceiveMessage::attribute_names`].
pub mod attribute_names {
    pub const ALL: &str = "All";
    pub const APPROXIMATE_RECEIVE_COUNT: &str = "ApproximateReceiveCount";
    pub const APPROXIMATE_FIRST_RECEIVE_TIMESTAMP: &str = "ApproximateFirstReceiveTimestamp";
    pub const MESSAGE_DEDUPLICATION_ID: &str = "MessageDeduplicationId";
    pub const MESSAGE_GROUP_ID: &str = "MessageGroupId";
    pub const SENDER_ID: &str = "SenderId";
    pub const SENT_TIMESTAMP: &str = "SentTimestamp";
    pub const SEQUENCE_NUMBER: &str = "SequenceNumber";
}

// ============================================================================
// Attributes
// ============================================================================

/// User-defined message attribute
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct MessageAttributeValue {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub string_value: Option<String>,

    /// Raw bytes; base64-encoded on the wire
    #[serde(
        default,
        with = "base64_bytes",
        skip_serializing_if = "Option::is_none"
    )]
    pub binary_value: Option<Vec<u8>>,

    /// `String`, `Number` or `Binary`, optionally with a custom label suffix
    pub data_type: String,
}

impl MessageAttributeValue {
    pub fn string(value: impl Into<String>) -> Self {
        Self {
            string_value: Some(value.into()),
            binary_value: None,
            data_type: "String".to_string(),
        }
    }

    pub fn number(value: impl fmt::Display) -> Self {
        Self {
            string_value: Some(value.to_string()),
            binary_value: None,
            data_type: "Number".to_string(),
        }
    }

    pub fn binary(value: impl Into<Vec<u8>>) -> Self {
        Self {
            string_value: None,
            binary_value: Some(value.into()),
            data_type: "Binary".to_string(),
        }
    }
}

/// System attribute attached to a message (currently only `AWSTraceHeader`)
pub type MessageSystemAttributeValue = MessageAttributeValue;

// ============================================================================
// SendMessage
// ============================================================================

/// Body of a `SendMessage` request
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct SendMessage {
    pub message_body: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delay_seconds: Option<u32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message_attributes: Option<HashMap<String, MessageAttributeValue>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message_system_attributes: Option<HashMap<String, MessageSystemAttributeValue>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message_deduplication_id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message_group_id: Option<String>,
}

impl SendMessage {
    pub fn new(body: impl Into<String>) -> Self {
        Self {
            message_body: body.into(),
            ..Default::default()
        }
    }

    pub fn with_delay_seconds(mut self, delay_seconds: u32) -> Self {
        self.delay_seconds = Some(delay_seconds);
        self
    }

    pub fn with_attribute(mut self, name: impl Into<String>, value: MessageAttributeValue) -> Self {
        self.message_attributes
            .get_or_insert_with(HashMap::new)
            .insert(name.into(), value);
        self
    }

    /// Set FIFO group and deduplication identifiers
    pub fn with_fifo(
        mut self,
        group_id: impl Into<String>,
        deduplication_id: Option<String>,
    ) -> Self {
        self.message_group_id = Some(group_id.into());
        self.message_deduplication_id = deduplication_id;
        self
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SendMessageResult {
    #[serde(
        rename = "MD5OfMessageBody",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub md5_of_message_body: Option<String>,

    #[serde(
        rename = "MD5OfMessageAttributes",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub md5_of_message_attributes: Option<String>,

    #[serde(
        rename = "MD5OfMessageSystemAttributes",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub md5_of_message_system_attributes: Option<String>,

    #[serde(rename = "MessageId", default, skip_serializing_if = "Option::is_none")]
    pub message_id: Option<String>,

    #[serde(
        rename = "SequenceNumber",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub sequence_number: Option<String>,
}

// ============================================================================
// Batch entries
// ============================================================================

/// One entry of a `SendMessageBatch` request
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SendMessageBatchItem {
    #[serde(rename = "Id", default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    #[serde(flatten)]
    pub message: SendMessage,
}

impl SendMessageBatchItem {
    pub fn new(message: SendMessage) -> Self {
        Self { id: None, message }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }
}

impl From<SendMessage> for SendMessageBatchItem {
    fn from(message: SendMessage) -> Self {
        Self::new(message)
    }
}

impl BatchEntry for SendMessageBatchItem {
    fn entry_id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    fn set_entry_id(&mut self, id: String) {
        self.id = Some(id);
    }
}

/// One entry of a `DeleteMessageBatch` request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct DeleteMessageBatchEntry {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub receipt_handle: String,
}

impl DeleteMessageBatchEntry {
    pub fn new(receipt_handle: impl Into<String>) -> Self {
        Self {
            id: None,
            receipt_handle: receipt_handle.into(),
        }
    }
}

impl BatchEntry for DeleteMessageBatchEntry {
    fn entry_id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    fn set_entry_id(&mut self, id: String) {
        self.id = Some(id);
    }
}

/// One entry of a `ChangeMessageVisibilityBatch` request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ChangeMessageVisibilityBatchEntry {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub receipt_handle: String,
    pub visibility_timeout: u32,
}

impl ChangeMessageVisibilityBatchEntry {
    pub fn new(receipt_handle: impl Into<String>, visibility_timeout: u32) -> Self {
        Self {
            id: None,
            receipt_handle: receipt_handle.into(),
            visibility_timeout,
        }
    }
}

impl BatchEntry for ChangeMessageVisibilityBatchEntry {
    fn entry_id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    fn set_entry_id(&mut self, id: String) {
        self.id = Some(id);
    }
}

/// Wire wrapper for every batch request: `{"Entries": [...]}`
#[derive(Debug, Serialize)]
pub(crate) struct BatchRequest<'a, T> {
    #[serde(rename = "Entries")]
    pub entries: &'a [T],
}

// ============================================================================
// Batch results
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SendMessageBatchResultEntry {
    #[serde(rename = "Id")]
    pub id: String,

    #[serde(rename = "MessageId")]
    pub message_id: String,

    #[serde(rename = "MD5OfMessageBody")]
    pub md5_of_message_body: String,

    #[serde(
        rename = "MD5OfMessageAttributes",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub md5_of_message_attributes: Option<String>,

    #[serde(
        rename = "MD5OfMessageSystemAttributes",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub md5_of_message_system_attributes: Option<String>,

    #[serde(
        rename = "SequenceNumber",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub sequence_number: Option<String>,
}

/// Successful entry of a delete or change-visibility batch
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct BatchResultEntry {
    pub id: String,
}

/// Entry the service rejected inside an otherwise successful batch call
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct BatchResultErrorEntry {
    pub id: String,
    pub sender_fault: bool,
    pub code: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// Outcome of a batch operation, merged across all chunks in submission order.
///
/// `failed` entries are data, not errors: a batch can partially succeed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct BatchResult<T> {
    #[serde(default)]
    pub successful: Vec<T>,
    #[serde(default)]
    pub failed: Vec<BatchResultErrorEntry>,
}

impl<T> BatchResult<T> {
    /// Append another chunk's outcome after this one.
    pub fn merge(&mut self, other: BatchResult<T>) {
        self.successful.extend(other.successful);
        self.failed.extend(other.failed);
    }

    pub fn is_complete_success(&self) -> bool {
        self.failed.is_empty()
    }
}

impl<T> Default for BatchResult<T> {
    fn default() -> Self {
        Self {
            successful: Vec::new(),
            failed: Vec::new(),
        }
    }
}

pub type SendMessageBatchResult = BatchResult<SendMessageBatchResultEntry>;
pub type DeleteMessageBatchResult = BatchResult<BatchResultEntry>;
pub type ChangeMessageVisibilityBatchResult = BatchResult<BatchResultEntry>;

// ============================================================================
// ReceiveMessage
// ============================================================================

/// Body of a `ReceiveMessage` request
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ReceiveMessage {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attribute_names: Option<Vec<String>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message_attribute_names: Option<Vec<String>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_number_of_messages: Option<u32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub visibility_timeout: Option<u32>,

    /// Long-poll duration; clamped to 20 seconds and defaulted to 20 when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wait_time_seconds: Option<u32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub receive_request_attempt_id: Option<String>,
}

impl ReceiveMessage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_wait_time_seconds(mut self, seconds: u32) -> Self {
        self.wait_time_seconds = Some(seconds);
        self
    }

    pub fn with_max_number_of_messages(mut self, max: u32) -> Self {
        self.max_number_of_messages = Some(max);
        self
    }

    pub fn with_visibility_timeout(mut self, seconds: u32) -> Self {
        self.visibility_timeout = Some(seconds);
        self
    }

    pub fn with_attribute_names<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.attribute_names = Some(names.into_iter().map(Into::into).collect());
        self
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ReceiveMessageResult {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub messages: Vec<Message>,
}

/// A message returned by `ReceiveMessage`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    #[serde(rename = "MessageId", default, skip_serializing_if = "Option::is_none")]
    pub message_id: Option<String>,

    #[serde(
        rename = "ReceiptHandle",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub receipt_handle: Option<String>,

    #[serde(rename = "MD5OfBody", default, skip_serializing_if = "Option::is_none")]
    pub md5_of_body: Option<String>,

    #[serde(rename = "Body", default, skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,

    #[serde(rename = "Attributes", default, skip_serializing_if = "Option::is_none")]
    pub attributes: Option<HashMap<String, String>>,

    #[serde(
        rename = "MD5OfMessageAttributes",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub md5_of_message_attributes: Option<String>,

    #[serde(
        rename = "MessageAttributes",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub message_attributes: Option<HashMap<String, MessageAttributeValue>>,
}

impl Message {
    /// Number of times the message has been received, if the attribute was requested
    pub fn receive_count(&self) -> Option<u32> {
        self.attributes
            .as_ref()?
            .get(attribute_names::APPROXIMATE_RECEIVE_COUNT)?
            .parse()
            .ok()
    }
}

mod base64_bytes {
    use base64::{engine::general_purpose::STANDARD, Engine};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Option<Vec<u8>>, serializer: S) -> Result<S::Ok, S::Error> {
        match value {
            Some(bytes) => serializer.serialize_str(&STANDARD.encode(bytes)),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<Vec<u8>>, D::Error> {
        let encoded: Option<String> = Option::deserialize(deserializer)?;
        encoded
            .map(|text| STANDARD.decode(text).map_err(serde::de::Error::custom))
            .transpose()
    }
}
