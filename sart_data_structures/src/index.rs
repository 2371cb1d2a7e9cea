use std::{fmt::Debug, hash::Hash};

pub trait IndexType: Debug + Copy + Eq + Hash + Ord {
    fn new(idx: u32) -> Self;

    fn as_u32(&self) -> u32;

    #[inline]
    fn as_usize(&self) -> usize {
        self.as_u32() as usize
    }

    fn from_usize(idx: usize) -> Self;

    fn try_from_usize(idx: usize) -> Option<Self>;
}

#[macro_export]
macro_rules! idx_ty {
    ($name:ident) => {
        #[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
        #[repr(transparent)]
        pub struct $name(u32);

        impl $crate::index::IndexType for $name {
            #[inline]
            fn new(idx: u32) -> Self {
                Self(idx)
            }

            #[inline]
            fn as_u32(&self) -> u32 {
                self.0
            }

            #[inline]
            fn from_usize(idx: usize) -> Self {
                match $crate::index::IndexType::try_from_usize(idx) {
                    Some(this) => this,
                    None => panic!("{} reached u32::MAX limit", stringify!($name)),
                }
            }

            #[inline]
            fn try_from_usize(idx: usize) -> Option<Self> {
                u32::try_from(idx).ok().map(Self)
            }
        }

        impl ::std::fmt::Debug for $name {
            #[inline]
            fn fmt(&self, f: &mut ::std::fmt::Formatter<'_>) -> ::std::fmt::Result {
                write!(f, "{}({})", stringify!($name), self.0)
            }
        }

        impl ::std::fmt::Display for $name {
            #[inline]
            fn fmt(&self, f: &mut ::std::fmt::Formatter<'_>) -> ::std::fmt::Result {
                ::std::fmt::Display::fmt(&self.0, f)
            }
        }
    };
}
