//! Mock BookSource for testing

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use super::{BookError, BookMove, BookQuery, BookSource};

type Response = Result<Vec<BookMove>, BookError>;

/// Scripted book source. Responses are keyed by the queried FEN and served
/// in the order they were added; the last one repeats.
#[derive(Default)]
pub struct MockBookSource {
    responses: Mutex<HashMap<String, VecDeque<Response>>>,
    delays: Mutex<VecDeque<Duration>>,
    call_log: Arc<Mutex<Vec<BookQuery>>>,
}

impl MockBookSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_moves(self, fen: &str, moves: Vec<BookMove>) -> Self {
        self.push_response(fen, Ok(moves));
        self
    }

    pub fn with_failure(self, fen: &str, reason: &str) -> Self {
        self.push_response(fen, Err(BookError::Lookup(reason.to_string())));
        self
    }

    /// Delay applied to successive calls, one entry per call.
    pub fn with_delays(self, delays: impl IntoIterator<Item = Duration>) -> Self {
        self.delays.lock().unwrap().extend(delays);
        self
    }

    pub fn calls(&self) -> Vec<BookQuery> {
        self.call_log.lock().unwrap().clone()
    }

    fn push_response(&self, fen: &str, response: Response) {
        self.responses
            .lock()
            .unwrap()
            .entry(fen.to_string())
            .or_default()
            .push_back(response);
    }

    fn next_response(&self, fen: &str) -> Response {
        let mut responses = self.responses.lock().unwrap();
        match responses.get_mut(fen) {
            Some(queue) if queue.len() > 1 => queue
                .pop_front()
                .unwrap_or_else(|| Err(BookError::Lookup("empty".into()))),
            Some(queue) => queue
                .front()
                .cloned()
                .unwrap_or_else(|| Err(BookError::Lookup("empty".into()))),
            None => Err(BookError::Lookup(format!("Mock response not configured for: {fen}"))),
        }
    }
}

#[async_trait]
impl BookSource for MockBookSource {
    async fn fetch(&self, query: BookQuery) -> Result<Vec<BookMove>, BookError> {
        self.call_log.lock().unwrap().push(query.clone());
        // Taken before sleeping so a cancelled call still consumes its response.
        let response = self.next_response(&query.fen);
        let delay = self.delays.lock().unwrap().pop_front();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        response
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_responses_served_in_order() {
        let source = MockBookSource::new()
            .with_moves("fen", vec![])
            .with_failure("fen", "down");
        let query = BookQuery {
            fen: "fen".into(),
            variant: "standard".into(),
            ratings: vec![],
            speeds: vec![],
        };
        assert_eq!(source.fetch(query.clone()).await, Ok(vec![]));
        assert!(source.fetch(query.clone()).await.is_err());
        assert!(source.fetch(query).await.is_err());
        assert_eq!(source.calls().len(), 3);
    }

    #[tokio::test]
    async fn test_unconfigured_fen_fails() {
        let source = MockBookSource::new();
        let query = BookQuery {
            fen: "other".into(),
            variant: "standard".into(),
            ratings: vec![],
            speeds: vec![],
        };
        assert!(matches!(source.fetch(query).await, Err(BookError::Lookup(_))));
    }
}
