//! Same-publication test used in place of structural equality.

use crate::record::Record;

/// Whether two records denote the same publication.
///
/// When both records carry a non-empty document id the ids alone decide. Otherwise
/// title, year, content type and publisher must all match. The relation is
/// commutative but not transitive across the two branches.
pub fn equivalent(a: &Record, b: &Record) -> bool {
    if let (Some(id_a), Some(id_b)) = (a.document(), b.document()) {
        return id_a == id_b;
    }
    a.title == b.title
        && a.year == b.year
        && a.content_type == b.content_type
        && a.publisher == b.publisher
}
