// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Iterator over a circular linked list

/// Walks `start, next(start), next(next(start)), ...` and stops before
/// returning to `start`.
#[derive(Clone)]
pub struct CircularListView<I, F> {
    start: I,
    current: Option<I>,
    next: F,
}

impl<I: Copy + PartialEq, F: Fn(I) -> I> CircularListView<I, F> {
    pub fn new(start: I, next: F) -> Self {
        Self {
            start,
            current: Some(start),
            next,
        }
    }
}

impl<I: Copy + PartialEq, F: Fn(I) -> I> Iterator for CircularListView<I, F> {
    type Item = I;

    fn next(&mut self) -> Option<I> {
        let current = self.current?;
        let following = (self.next)(current);
        self.current = if following == self.start {
            None
        } else {
            Some(following)
        };
        Some(current)
    }
}
