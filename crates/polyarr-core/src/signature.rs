//! Call signatures of the creation functions
//!
//! The registry is what lets a caller pass any prefix of a function's
//! parameters positionally and the rest by keyword.

use crate::{PolyarrError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamKind {
    Required,
    Optional,
    /// Collects every remaining positional argument
    Variadic,
}

#[derive(Debug, Clone, Copy)]
pub struct Param {
    pub name: &'static str,
    pub kind: ParamKind,
}

const fn req(name: &'static str) -> Param {
    Param {
        name,
        kind: ParamKind::Required,
    }
}

const fn opt(name: &'static str) -> Param {
    Param {
        name,
        kind: ParamKind::Optional,
    }
}

const fn var(name: &'static str) -> Param {
    Param {
        name,
        kind: ParamKind::Variadic,
    }
}

#[derive(Debug)]
pub struct Signature {
    pub name: &'static str,
    pub params: &'static [Param],
    /// Accepts a caller-supplied `out` buffer
    pub supports_out: bool,
    /// Callable as a method on its first argument
    pub supports_instance: bool,
}

static SIGNATURES: &[Signature] = &[
    Signature {
        name: "arange",
        params: &[req("start"), opt("stop"), opt("step"), opt("dtype"), opt("device")],
        supports_out: true,
        supports_instance: false,
    },
    Signature {
        name: "asarray",
        params: &[req("object_in"), opt("dtype"), opt("device")],
        supports_out: false,
        supports_instance: true,
    },
    Signature {
        name: "empty",
        params: &[req("shape"), opt("dtype"), opt("device")],
        supports_out: true,
        supports_instance: false,
    },
    Signature {
        name: "empty_like",
        params: &[req("x"), opt("dtype"), opt("device")],
        supports_out: true,
        supports_instance: true,
    },
    Signature {
        name: "eye",
        params: &[req("n_rows"), opt("n_cols"), opt("k"), opt("dtype"), opt("device")],
        supports_out: true,
        supports_instance: false,
    },
    Signature {
        name: "from_dlpack",
        params: &[req("x")],
        supports_out: true,
        supports_instance: true,
    },
    Signature {
        name: "full",
        params: &[req("shape"), req("fill_value"), opt("dtype"), opt("device")],
        supports_out: true,
        supports_instance: false,
    },
    Signature {
        name: "full_like",
        params: &[req("x"), req("fill_value"), opt("dtype"), opt("device")],
        supports_out: true,
        supports_instance: true,
    },
    Signature {
        name: "linspace",
        params: &[
            req("start"),
            req("stop"),
            req("num"),
            opt("axis"),
            opt("endpoint"),
            opt("dtype"),
            opt("device"),
        ],
        supports_out: true,
        supports_instance: false,
    },
    Signature {
        name: "logspace",
        params: &[
            req("start"),
            req("stop"),
            req("num"),
            opt("base"),
            opt("axis"),
            opt("endpoint"),
            opt("dtype"),
            opt("device"),
        ],
        supports_out: true,
        supports_instance: false,
    },
    Signature {
        name: "meshgrid",
        params: &[var("arrays"), opt("indexing")],
        supports_out: false,
        supports_instance: false,
    },
    Signature {
        name: "native_array",
        params: &[req("x"), opt("dtype"), opt("device")],
        supports_out: false,
        supports_instance: true,
    },
    Signature {
        name: "ones",
        params: &[req("shape"), opt("dtype"), opt("device")],
        supports_out: true,
        supports_instance: false,
    },
    Signature {
        name: "ones_like",
        params: &[req("x"), opt("dtype"), opt("device")],
        supports_out: true,
        supports_instance: true,
    },
    Signature {
        name: "tril",
        params: &[req("x"), opt("k")],
        supports_out: true,
        supports_instance: true,
    },
    Signature {
        name: "triu",
        params: &[req("x"), opt("k")],
        supports_out: true,
        supports_instance: true,
    },
    Signature {
        name: "zeros",
        params: &[req("shape"), opt("dtype"), opt("device")],
        supports_out: true,
        supports_instance: false,
    },
    Signature {
        name: "zeros_like",
        params: &[req("x"), opt("dtype"), opt("device")],
        supports_out: true,
        supports_instance: true,
    },
];

/// Look up a function's signature by name.
pub fn signature(name: &str) -> Option<&'static Signature> {
    SIGNATURES.iter().find(|s| s.name == name)
}

/// Every registered function name.
pub fn function_names() -> impl Iterator<Item = &'static str> {
    SIGNATURES.iter().map(|s| s.name)
}

/// Arguments matched to parameter names.
#[derive(Debug)]
pub struct BoundArgs<V> {
    function: &'static str,
    slots: Vec<(&'static str, Option<V>)>,
    rest: Vec<V>,
}

impl<V> BoundArgs<V> {
    pub fn function(&self) -> &'static str {
        self.function
    }

    /// Remove and return a parameter's value, `None` if it was not supplied.
    pub fn take(&mut self, name: &str) -> Option<V> {
        self.slots
            .iter_mut()
            .find(|(n, _)| *n == name)
            .and_then(|(_, v)| v.take())
    }

    /// Values gathered by the variadic parameter
    pub fn take_rest(&mut self) -> Vec<V> {
        std::mem::take(&mut self.rest)
    }
}

impl Signature {
    /// Number of parameters that may be passed positionally, not counting
    /// the variadic one.
    pub fn positional_arity(&self) -> usize {
        self.params
            .iter()
            .take_while(|p| p.kind != ParamKind::Variadic)
            .count()
    }

    pub fn has_variadic(&self) -> bool {
        self.params.iter().any(|p| p.kind == ParamKind::Variadic)
    }

    /// Position of a named parameter
    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.params.iter().position(|p| p.name == name)
    }

    /// Match positional and keyword arguments against the parameter list.
    pub fn bind<V>(&self, args: Vec<V>, kwargs: Vec<(String, V)>) -> Result<BoundArgs<V>> {
        let mut slots: Vec<(&'static str, Option<V>)> =
            self.params.iter().map(|p| (p.name, None)).collect();
        let mut rest = Vec::new();

        let given = args.len();
        let mut args = args.into_iter();
        for (i, param) in self.params.iter().enumerate() {
            if param.kind == ParamKind::Variadic {
                rest.extend(args.by_ref());
                break;
            }
            match args.next() {
                Some(v) => slots[i].1 = Some(v),
                None => break,
            }
        }
        if args.next().is_some() {
            return Err(PolyarrError::TooManyPositional {
                function: self.name.to_string(),
                max: self.positional_arity(),
                given,
            });
        }

        for (name, value) in kwargs {
            let idx = self
                .params
                .iter()
                .position(|p| p.name == name && p.kind != ParamKind::Variadic)
                .ok_or_else(|| PolyarrError::UnexpectedKeyword {
                    function: self.name.to_string(),
                    name: name.clone(),
                })?;
            if slots[idx].1.is_some() {
                return Err(PolyarrError::DuplicateArgument {
                    function: self.name.to_string(),
                    name,
                });
            }
            slots[idx].1 = Some(value);
        }

        if let Some(missing) = self
            .params
            .iter()
            .zip(&slots)
            .find(|(p, (_, v))| p.kind == ParamKind::Required && v.is_none())
        {
            return Err(PolyarrError::MissingArgument {
                function: self.name.to_string(),
                name: missing.0.name.to_string(),
            });
        }

        Ok(BoundArgs {
            function: self.name,
            slots,
            rest,
        })
    }
}
