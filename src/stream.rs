// src/stream.rs

//! Lazily-evaluated data streams exchanged between tasks.
//!
//! A [`DataStream`] is a *cold* handle: it describes how to produce a
//! sequence but does nothing until [`DataStream::subscribe`] is called and the
//! returned stream is polled. Each subscription re-runs the upstream chain, so
//! one produced stream can be handed to any number of successors.

use std::fmt;
use std::sync::Arc;

use futures::stream::{self, BoxStream, Stream, StreamExt};

type Factory<T> = dyn Fn() -> BoxStream<'static, T> + Send + Sync;

pub struct DataStream<T> {
    factory: Arc<Factory<T>>,
}

impl<T> Clone for DataStream<T> {
    fn clone(&self) -> Self {
        Self {
            factory: Arc::clone(&self.factory),
        }
    }
}

impl<T> fmt::Debug for DataStream<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DataStream").finish_non_exhaustive()
    }
}

impl<T: Send + 'static> DataStream<T> {
    /// Build from a function that creates a fresh stream per subscription.
    pub fn from_fn<F, S>(make: F) -> Self
    where
        F: Fn() -> S + Send + Sync + 'static,
        S: Stream<Item = T> + Send + 'static,
    {
        Self {
            factory: Arc::new(move || make().boxed()),
        }
    }

    /// Stream over a cloneable collection.
    pub fn iter<I>(items: I) -> Self
    where
        I: IntoIterator<Item = T> + Clone + Send + Sync + 'static,
        I::IntoIter: Send + 'static,
    {
        Self::from_fn(move || stream::iter(items.clone()))
    }

    pub fn empty() -> Self {
        Self::from_fn(stream::empty::<T>)
    }

    /// Start a new evaluation of this stream.
    pub fn subscribe(&self) -> BoxStream<'static, T> {
        (self.factory)()
    }

    pub fn map<U, F>(&self, f: F) -> DataStream<U>
    where
        U: Send + 'static,
        F: Fn(T) -> U + Send + Sync + 'static,
    {
        let upstream = self.clone();
        let f = Arc::new(f);
        DataStream::from_fn(move || {
            let f = Arc::clone(&f);
            upstream.subscribe().map(move |item| f(item))
        })
    }

    /// Pairwise combination; ends with the shorter of the two streams.
    pub fn zip_with<U, V, F>(&self, other: &DataStream<U>, f: F) -> DataStream<V>
    where
        U: Send + 'static,
        V: Send + 'static,
        F: Fn(T, U) -> V + Send + Sync + 'static,
    {
        let left = self.clone();
        let right = other.clone();
        let f = Arc::new(f);
        DataStream::from_fn(move || {
            let f = Arc::clone(&f);
            left.subscribe()
                .zip(right.subscribe())
                .map(move |(a, b)| f(a, b))
        })
    }

    /// All elements of `self`, then all elements of `other`.
    pub fn chain(&self, other: &DataStream<T>) -> DataStream<T> {
        let first = self.clone();
        let second = other.clone();
        DataStream::from_fn(move || first.subscribe().chain(second.subscribe()))
    }

    /// Subscribe and drain the stream.
    pub async fn collect(&self) -> Vec<T> {
        self.subscribe().collect().await
    }
}
