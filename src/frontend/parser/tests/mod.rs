//! Parser tests module
