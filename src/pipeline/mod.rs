//! Pipeline stages of an identity verification.
//!
//! Each submodule implements one step. Only [`input`], [`staging`] and
//! [`poller`] touch I/O; the text scans are pure functions over line lists.
//!
//! ## Data Flow
//!
//! ```text
//! selfie ─┐
//!         ├──▶ face comparison ──▶ verdict
//! ID doc ─┤
//!         └──▶ OCR ──▶ lines ──▶ fields (NOME, CPF)
//!                                   │ name
//! proof ──▶ staging ──▶ job ──▶ poller ──▶ lines ──▶ address
//!                                                └──▶ matcher
//! ```
//!
//! 1. [`input`]   — read a path or URL into memory, extension allowlist
//! 2. [`lines`]   — keep the ordered `LINE` texts of an OCR block list
//! 3. [`fields`]  — label and address scans over those lines
//! 4. [`matcher`] — literal name check across documents
//! 5. [`staging`] — scoped put/delete of the proof of residence
//! 6. [`poller`]  — wait for the async text job to reach a terminal status

pub mod fields;
pub mod input;
pub mod lines;
pub mod matcher;
pub mod poller;
pub mod staging;
