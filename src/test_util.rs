//! Scripted transports and collecting sinks shared by the unit tests
use crate::sink::Sink;
use crate::TransportError;
use bytes::Bytes;
use reqwest::header::HeaderMap;
use reqwest::{StatusCode, Url};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};

/// Sink remembering everything it receives
pub(crate) struct CollectSink<T>(Arc<Mutex<Vec<T>>>);

impl<T> Clone for CollectSink<T> {
    fn clone(&self) -> Self {
        Self(self.0.clone())
    }
}

impl<T> Default for CollectSink<T> {
    fn default() -> Self {
        Self(Arc::new(Mutex::new(Vec::new())))
    }
}

impl<T: Clone> CollectSink<T> {
    pub(crate) fn items(&self) -> Vec<T> {
        self.0.lock().unwrap().clone()
    }
}

impl<T: Send + 'static> CollectSink<T> {
    pub(crate) fn shared(&self) -> Arc<dyn Sink<T>> {
        Arc::new(self.clone())
    }
}

impl<T: Send> Sink<T> for CollectSink<T> {
    fn send(&self, item: T) {
        self.0.lock().unwrap().push(item);
    }
}

/// One scripted transport outcome
#[derive(Debug, Clone)]
pub(crate) enum Step {
    Reply(u16, &'static str),
    Network(&'static str),
    Build(&'static str),
}

/// Transport replaying [`Step`]s in order, the last one repeats forever
#[derive(Clone)]
pub(crate) struct Script {
    steps: Arc<Mutex<VecDeque<Step>>>,
    calls: Arc<AtomicU32>,
}

/// Parts of a scripted reply, turned into a flavor specific response
pub(crate) struct Reply {
    pub(crate) status: StatusCode,
    pub(crate) headers: HeaderMap,
    pub(crate) url: Url,
    pub(crate) body: Bytes,
}

impl Script {
    pub(crate) fn new(steps: Vec<Step>) -> Self {
        Self {
            steps: Arc::new(Mutex::new(steps.into())),
            calls: Arc::new(AtomicU32::new(0)),
        }
    }

    pub(crate) fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }

    pub(crate) fn next(&self, url: &Url) -> Result<Reply, TransportError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let step = {
            let mut steps = self.steps.lock().unwrap();
            if steps.len() > 1 {
                steps.pop_front().unwrap()
            } else {
                steps.front().cloned().unwrap()
            }
        };
        match step {
            Step::Reply(code, body) => Ok(Reply {
                status: StatusCode::from_u16(code).unwrap(),
                headers: HeaderMap::new(),
                url: url.clone(),
                body: Bytes::from_static(body.as_bytes()),
            }),
            Step::Network(msg) => Err(TransportError::network(msg)),
            Step::Build(msg) => Err(TransportError::build(msg)),
        }
    }
}
