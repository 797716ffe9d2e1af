//! LRU cache for query embeddings.
//!
//! Chat traffic repeats short queries often; each hit skips a model run.

use std::collections::{HashMap, VecDeque};
use std::time::{Duration, Instant};

use ndarray::Array1;
use parking_lot::Mutex;

/// Thread-safe LRU cache with a per-entry TTL.
pub struct QueryCache {
    inner: Mutex<CacheInner>,
    max_size: usize,
    ttl: Duration,
}

struct CacheInner {
    entries: HashMap<String, (Array1<f32>, Instant)>,
    /// Least recently used at the front.
    order: VecDeque<String>,
}

impl CacheInner {
    fn touch(&mut self, key: &str) {
        if let Some(pos) = self.order.iter().position(|k| k == key) {
            if let Some(k) = self.order.remove(pos) {
                self.order.push_back(k);
            }
        }
    }

    fn forget(&mut self, key: &str) {
        self.entries.remove(key);
        self.order.retain(|k| k != key);
    }
}

impl QueryCache {
    pub fn new(max_size: usize, ttl: Duration) -> Self {
        Self {
            inner: Mutex::new(CacheInner {
                entries: HashMap::with_capacity(max_size),
                order: VecDeque::with_capacity(max_size),
            }),
            max_size: max_size.max(1),
            ttl,
        }
    }

    /// 1000 entries, one hour TTL.
    pub fn default_cache() -> Self {
        Self::new(1000, Duration::from_secs(3600))
    }

    pub fn get(&self, query: &str) -> Option<Array1<f32>> {
        let mut inner = self.inner.lock();
        let (embedding, expired) = match inner.entries.get(query) {
            Some((emb, at)) => (emb.clone(), at.elapsed() >= self.ttl),
            None => return None,
        };
        if expired {
            inner.forget(query);
            return None;
        }
        inner.touch(query);
        Some(embedding)
    }

    pub fn put(&self, query: String, embedding: Array1<f32>) {
        let mut inner = self.inner.lock();
        if inner.entries.contains_key(&query) {
            inner.touch(&query);
        } else {
            while inner.entries.len() >= self.max_size {
                match inner.order.pop_front() {
                    Some(oldest) => {
                        inner.entries.remove(&oldest);
                    }
                    None => break,
                }
            }
            inner.order.push_back(query.clone());
        }
        inner.entries.insert(query, (embedding, Instant::now()));
    }

    pub fn len(&self) -> usize {
        self.inner.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
