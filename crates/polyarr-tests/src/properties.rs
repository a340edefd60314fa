//! Value-level properties of the creation functions, checked on every
//! configured backend rather than against the reference
