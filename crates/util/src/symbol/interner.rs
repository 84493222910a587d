use ahash::AHasher;
use dashmap::DashMap;
use std::hash::{BuildHasherDefault, Hasher};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::OnceLock;

/// A cheap, `Copy` handle to an interned string.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Symbol(u32);

impl Symbol {
    /// Resolves this symbol back to its string contents.
    pub fn as_str(&self) -> &'static str {
        interner().resolve(*self)
    }
}

impl std::fmt::Display for Symbol {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

type Map = DashMap<&'static str, u32, BuildHasherDefault<AHasher>>;

/// A process-global string interner.
///
/// Strings are leaked once and never reclaimed, which is acceptable for a
/// one-shot compiler/VM process; the table is shared across threads via
/// [`DashMap`].
pub struct Interner {
    map: Map,
    strings: boxcar::Vec<&'static str>,
    next: AtomicU32,
}

impl Interner {
    fn new() -> Self {
        let interner = Self {
            map: DashMap::default(),
            strings: boxcar::Vec::new(),
            next: AtomicU32::new(0),
        };
        for kw in KEYWORDS.iter().chain(BUILTIN_NAMES.iter()) {
            interner.intern(kw);
        }
        interner
    }

    /// Interns a string, returning its `Symbol`. Re-interning the same
    /// string returns the same `Symbol`.
    pub fn intern(&self, s: &str) -> Symbol {
        if let Some(existing) = self.map.get(s) {
            return Symbol(*existing);
        }
        let leaked: &'static str = Box::leak(s.to_owned().into_boxed_str());
        let id = self.next.fetch_add(1, Ordering::Relaxed);
        self.strings.insert(leaked);
        self.map.insert(leaked, id);
        Symbol(id)
    }

    /// Resolves a symbol to its interned string.
    pub fn resolve(&self, symbol: Symbol) -> &'static str {
        self.strings
            .get(symbol.0 as usize)
            .copied()
            .expect("symbol not present in interner")
    }
}

/// The reserved words of the language; pre-interned so keyword comparisons
/// are a cheap integer compare instead of a string compare.
pub const KEYWORDS: &[&str] = &[
    "var", "fun", "if", "else", "elsif", "while", "for", "return", "continue", "break", "and",
    "or", "true", "false", "nil",
];

/// The names of the built-in functions, pre-interned for the same
/// reason as [`KEYWORDS`].
pub const BUILTIN_NAMES: &[&str] = &["print", "println", "input", "len", "int", "str", "isinteger"];

static INTERNER: OnceLock<Interner> = OnceLock::new();

/// Returns the process-global interner, initializing it on first use.
pub fn interner() -> &'static Interner {
    INTERNER.get_or_init(Interner::new)
}

/// Interns a string in the global interner.
pub fn intern(s: &str) -> Symbol {
    interner().intern(s)
}

// Minimal append-only, indexable vector with interior mutability, enough to
// back the interner without pulling in a heavier crate. Grows by pushing
// into a `Vec` guarded by a mutex; reads never block writers for long since
// entries are never removed.
mod boxcar {
    use std::sync::Mutex;

    pub struct Vec<T> {
        inner: Mutex<std::vec::Vec<T>>,
    }

    impl<T: Copy> Vec<T> {
        pub fn new() -> Self {
            Self {
                inner: Mutex::new(std::vec::Vec::new()),
            }
        }

        pub fn insert(&self, value: T) {
            self.inner.lock().expect("interner lock poisoned").push(value);
        }

        pub fn get(&self, index: usize) -> Option<T> {
            self.inner.lock().expect("interner lock poisoned").get(index).copied()
        }
    }
}
