use bitflags::bitflags;

bitflags! {
    /// Parsing modes threaded by value through every parse call.
    ///
    /// The low byte holds the options a caller passes in; the remaining bits
    /// are set and cleared by the parser as it descends into functions,
    /// classes, loops and for-heads. A nested construct always receives a
    /// modified copy, so leaving a construct restores the outer modes for free.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
    pub struct Context: u32 {
        const STRICT = 1 << 0;
        const MODULE = 1 << 1;
        const OPTIONS_DISABLE_WEB_COMPAT = 1 << 2;
        const OPTIONS_LOC = 1 << 3;
        const OPTIONS_NEXT = 1 << 4;

        const IN_FUNCTION = 1 << 8;
        const IN_GENERATOR = 1 << 9;
        const IN_ASYNC = 1 << 10;
        const IN_CLASS_FIELD = 1 << 11;
        const DISALLOW_IN = 1 << 12;
        const IN_ITERATION = 1 << 13;
        const IN_SWITCH = 1 << 14;
        const IN_FORMAL_PARAMETERS = 1 << 15;
        const ALLOW_SUPER_PROPERTY = 1 << 16;
        const ALLOW_SUPER_CALL = 1 << 17;
        const ALLOW_NEW_TARGET = 1 << 18;
        const IN_STATIC_BLOCK = 1 << 19;
        const IN_CLASS_BODY = 1 << 20;
    }
}

impl Context {
    pub const EMPTY: Context = Context::empty();

    /// Flags that describe the enclosing function body and are reset on
    /// entering a new one.
    pub(crate) const FUNCTION_BOUNDARY: Context = Context::IN_GENERATOR
        .union(Context::IN_ASYNC)
        .union(Context::IN_CLASS_FIELD)
        .union(Context::DISALLOW_IN)
        .union(Context::IN_ITERATION)
        .union(Context::IN_SWITCH)
        .union(Context::IN_FORMAL_PARAMETERS)
        .union(Context::IN_STATIC_BLOCK);

    #[must_use]
    pub const fn with(self, flags: Context) -> Context {
        self.union(flags)
    }

    /// `STRICT` survives: once a scope is strict, everything nested in it is.
    #[must_use]
    pub const fn without(self, flags: Context) -> Context {
        let cleared = self.difference(flags);
        if self.contains(Context::STRICT) {
            cleared.union(Context::STRICT)
        } else {
            cleared
        }
    }

    pub const fn is_strict(self) -> bool {
        self.contains(Context::STRICT)
    }

    pub const fn is_module(self) -> bool {
        self.contains(Context::MODULE)
    }

    /// Annex B forms are accepted in sloppy code unless the caller opted out.
    pub const fn allows_web_compat(self) -> bool {
        !self.contains(Context::STRICT) && !self.contains(Context::OPTIONS_DISABLE_WEB_COMPAT)
    }

    pub const fn tracks_locations(self) -> bool {
        self.contains(Context::OPTIONS_LOC)
    }

    pub const fn allows_next(self) -> bool {
        self.contains(Context::OPTIONS_NEXT)
    }

    /// Keeps only the caller options, dropping every function/class mode.
    #[must_use]
    pub(crate) const fn options(self) -> Context {
        self.intersection(
            Context::STRICT
                .union(Context::MODULE)
                .union(Context::OPTIONS_DISABLE_WEB_COMPAT)
                .union(Context::OPTIONS_LOC)
                .union(Context::OPTIONS_NEXT),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn with_and_without_return_new_values() {
        let base = Context::EMPTY;
        let inner = base.with(Context::IN_FUNCTION | Context::IN_ASYNC);
        assert!(inner.contains(Context::IN_ASYNC));
        assert!(base.is_empty());
        assert!(!inner.without(Context::IN_ASYNC).contains(Context::IN_ASYNC));
    }

    #[test]
    fn strict_is_irreversible() {
        let ctx = Context::STRICT.with(Context::IN_FUNCTION);
        assert!(ctx.without(Context::STRICT).is_strict());
        assert!(ctx.without(Context::FUNCTION_BOUNDARY).is_strict());
    }

    #[test]
    fn web_compat_needs_sloppy_code() {
        assert!(Context::EMPTY.allows_web_compat());
        assert!(!Context::STRICT.allows_web_compat());
        assert!(!Context::OPTIONS_DISABLE_WEB_COMPAT.allows_web_compat());
    }

    #[test]
    fn options_drop_internal_modes() {
        let ctx = Context::MODULE | Context::OPTIONS_LOC | Context::IN_GENERATOR;
        assert_eq!(ctx.options(), Context::MODULE | Context::OPTIONS_LOC);
    }
}
