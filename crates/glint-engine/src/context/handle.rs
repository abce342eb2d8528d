use std::num::NonZeroU32;

macro_rules! gl_handle {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
        pub struct $name(NonZeroU32);

        impl $name {
            #[inline]
            pub const fn new(name: NonZeroU32) -> Self {
                Self(name)
            }

            /// The native object name.
            #[inline]
            pub const fn get(self) -> u32 {
                self.0.get()
            }

            #[inline]
            #[cfg_attr(not(feature = "glow"), allow(dead_code))]
            pub(crate) const fn raw(self) -> NonZeroU32 {
                self.0
            }
        }
    };
}

gl_handle!(
    /// Native buffer object name.
    BufferHandle
);
gl_handle!(
    /// Native shader object name.
    ShaderHandle
);
gl_handle!(
    /// Native program object name.
    ProgramHandle
);
gl_handle!(
    /// Native texture object name.
    TextureHandle
);
gl_handle!(
    /// Native vertex array object name.
    VertexArrayHandle
);

/// Location of a uniform inside a linked program.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub struct UniformLocation(pub u32);
