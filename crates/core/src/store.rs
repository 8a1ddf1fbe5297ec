//! Ordered annotation store
//!
//! A single-writer, insertion-ordered collection. The editor is the
//! only mutator (single UI thread), so there is no locking and no
//! transactional machinery: each operation is one collection mutation.

use crate::annotation::{Annotation, AnnotationId};
use crate::geometry::Point;

/// Insertion-ordered collection of annotations across all pages
#[derive(Debug, Default)]
pub struct AnnotationStore {
    annotations: Vec<Annotation>,
}

impl AnnotationStore {
    /// Create a new empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an annotation to the collection.
    pub fn add(&mut self, annotation: Annotation) {
        self.annotations.push(annotation);
    }

    /// Remove the annotation with the given id, returning it.
    pub fn remove(&mut self, id: AnnotationId) -> Option<Annotation> {
        let index = self.annotations.iter().position(|a| a.id() == id)?;
        Some(self.annotations.remove(index))
    }

    /// Get an annotation by id.
    pub fn get(&self, id: AnnotationId) -> Option<&Annotation> {
        self.annotations.iter().find(|a| a.id() == id)
    }

    /// All annotations on a page, in insertion order.
    ///
    /// Lazy and restartable: call again to iterate again.
    pub fn for_page(&self, page_number: u16) -> impl Iterator<Item = &Annotation> + '_ {
        self.annotations.iter().filter(move |a| a.page_number() == page_number)
    }

    /// All annotations in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &Annotation> + '_ {
        self.annotations.iter()
    }

    /// First annotation on the page hit by the point, in store order.
    ///
    /// Erasing acts on this single match even when several annotations
    /// overlap: one-at-a-time erase is deliberate policy.
    pub fn hit_first(&self, page_number: u16, point: Point) -> Option<&Annotation> {
        self.for_page(page_number).find(|a| a.hit_test(point))
    }

    pub fn len(&self) -> usize {
        self.annotations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.annotations.is_empty()
    }

    /// Drop all annotations (used when the underlying document changes).
    pub fn clear(&mut self) {
        self.annotations.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::annotation::Color;

    fn stroke(page: u16, y: f32) -> Annotation {
        Annotation::draw(
            page,
            vec![Point::new(0.0, y), Point::new(100.0, y)],
            Color::RED,
            3.0,
        )
    }

    #[test]
    fn test_add_then_remove_leaves_no_trace() {
        let mut store = AnnotationStore::new();
        let annotation = stroke(1, 0.0);
        let id = annotation.id();

        store.add(annotation);
        assert_eq!(store.len(), 1);

        store.remove(id);
        assert!(store.is_empty());
        assert!(store.get(id).is_none());
    }

    #[test]
    fn test_remove_unknown_id_is_none() {
        let mut store = AnnotationStore::new();
        store.add(stroke(1, 0.0));
        assert!(store.remove(AnnotationId::new_v4()).is_none());
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_for_page_filters_and_preserves_order() {
        let mut store = AnnotationStore::new();
        let a = stroke(1, 0.0);
        let b = stroke(2, 10.0);
        let c = stroke(1, 20.0);
        let (id_a, id_c) = (a.id(), c.id());

        store.add(a);
        store.add(b);
        store.add(c);

        let page_one: Vec<_> = store.for_page(1).map(|a| a.id()).collect();
        assert_eq!(page_one, vec![id_a, id_c]);
        assert!(store.for_page(1).all(|a| a.page_number() == 1));
        assert_eq!(store.for_page(3).count(), 0);

        // Restartable: a second pass sees the same sequence
        let again: Vec<_> = store.for_page(1).map(|a| a.id()).collect();
        assert_eq!(again, page_one);
    }

    #[test]
    fn test_hit_first_returns_earliest_match_only() {
        let mut store = AnnotationStore::new();
        let first = stroke(1, 0.0);
        let second = stroke(1, 0.0); // fully overlapping
        let first_id = first.id();

        store.add(first);
        store.add(second);

        let hit = store.hit_first(1, Point::new(50.0, 5.0)).expect("should hit");
        assert_eq!(hit.id(), first_id);
    }

    #[test]
    fn test_hit_first_ignores_other_pages() {
        let mut store = AnnotationStore::new();
        store.add(stroke(2, 0.0));
        assert!(store.hit_first(1, Point::new(50.0, 0.0)).is_none());
    }

    #[test]
    fn test_clear() {
        let mut store = AnnotationStore::new();
        store.add(stroke(1, 0.0));
        store.add(stroke(2, 0.0));
        store.clear();
        assert!(store.is_empty());
    }
}
