use std::sync::atomic::{AtomicUsize, Ordering};

/// Canned supportive replies used when no completion service answers.
pub const FALLBACK_RESPONSES: [&str; 6] = [
    "I hear that you're going through a difficult time. While I'm here to listen and support you, remember that I'm a test assistant. Would you like to tell me more about what's on your mind?",
    "Thank you for sharing that with me. It takes courage to open up. How long have you been feeling this way?",
    "I understand this is challenging. While I'm here to support you, I want to remind you that speaking with a mental health professional can provide more comprehensive help. Would you like to explore what you're feeling further?",
    "Your feelings are valid, and it's important to acknowledge them. Have you considered talking to someone you trust about this?",
    "It sounds like you're dealing with a lot right now. Let's take it one step at a time. What would feel like a manageable first step for you?",
    "I appreciate you trusting me with your thoughts. While I'm in test mode, I want you to know that your well-being matters. What kind of support are you looking for right now?",
];

/// Round-robin selector over [`FALLBACK_RESPONSES`].
///
/// One instance is shared by every request in the process. Each call is a
/// single atomic read-modify-write on the cursor, so concurrent callers never
/// get the same slot twice within a cycle, but which caller gets which reply
/// is unspecified. The cursor starts at zero and is not persisted.
#[derive(Debug, Default)]
pub struct FallbackResponder {
    cursor: AtomicUsize,
}

impl FallbackResponder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the reply under the cursor and advance it by one, wrapping.
    pub fn next(&self) -> &'static str {
        let len = FALLBACK_RESPONSES.len();
        let index = self
            .cursor
            .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |i| Some((i + 1) % len))
            .unwrap_or_else(|current| current);
        FALLBACK_RESPONSES[index]
    }

}
