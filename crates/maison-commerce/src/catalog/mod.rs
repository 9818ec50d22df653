//! Catalog types: categories with tree indices, normalized products.

mod category;
mod product;

pub use category::{
    Breadcrumb, CategoryIndex, CategoryResponse, CategoryTreeNode, IndexedCategory, RawCategory,
};
pub use product::{Product, ProductPrice};
