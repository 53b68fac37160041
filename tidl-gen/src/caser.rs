//! Case conversion for generated C symbols.
//!
//! Identifiers are split into words before every upper-case character that is
//! not the first one, then joined back with the casing of the marker.

use std::{borrow::Cow, marker::PhantomData};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Word<'a>(Cow<'a, str>);

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Words<'a>(Vec<Word<'a>>);

#[derive(Clone, PartialEq, Eq)]
pub struct Cased<What, Marker> {
    what: What,
    _marker: PhantomData<Marker>,
}

macro_rules! declare_case_marker {
    ($marker:ident) => {
        pub struct $marker {}
    };
}

declare_case_marker! {SnakeCase}

declare_case_marker! {ScreamingSnakeCase}

impl<'a> From<&'a str> for Word<'a> {
    fn from(string: &'a str) -> Self {
        Word(Cow::from(string))
    }
}

impl<'a> From<String> for Word<'a> {
    fn from(string: String) -> Self {
        Word(Cow::from(string))
    }
}

impl<What, Marker> Cased<What, Marker> {
    fn case(what: What) -> Self {
        Cased {
            what,
            _marker: PhantomData,
        }
    }

    fn unwrap(self) -> What {
        self.what
    }
}

pub trait Case: Sized {
    fn case_word<'a, W: Into<Word<'a>>>(word: W) -> Cased<Word<'a>, Self>;

    fn case_words<'a, Ws: Into<Words<'a>>>(words: Ws) -> Cased<Words<'a>, Self> {
        Cased::case(Words(
            Words::from(words.into())
                .0
                .into_iter()
                .map(|word| Self::case_word(word).unwrap())
                .collect(),
        ))
    }

    fn from_words<'a>(words: Cased<Words<'a>, Self>) -> Cow<'a, str>;
}

impl<'a> Words<'a> {
    pub fn empty() -> Self {
        Words(Vec::new())
    }

    pub fn append(&mut self, word: Word<'a>) {
        self.0.push(word);
    }

    pub fn case<C: Case>(self) -> Cased<Words<'a>, C> {
        C::case_words(self)
    }

    fn join(self, separator: &str) -> Cow<'a, str> {
        let mut words = self.0;
        if words.len() == 1 {
            return words.remove(0).0;
        }
        Cow::from(
            words
                .into_iter()
                .map(|word| word.0)
                .collect::<Vec<_>>()
                .join(separator),
        )
    }
}

impl<'a, C: Case> Cased<Words<'a>, C> {
    pub fn format(self) -> Cow<'a, str> {
        C::from_words(self)
    }
}

/// Splits before every upper-case character except a leading one.
///
/// Existing underscores stay inside their words, so already snake-cased
/// input comes back unchanged.
pub fn to_words(string: &str) -> Words<'_> {
    let mut words = Words::empty();
    let mut start = 0;

    for (i, c) in string.char_indices().skip(1) {
        if c.is_uppercase() {
            words.append(Word::from(&string[start..i]));
            start = i;
        }
    }

    if start < string.len() {
        words.append(Word::from(&string[start..]));
    }

    words
}

impl Case for SnakeCase {
    fn case_word<'a, W: Into<Word<'a>>>(word: W) -> Cased<Word<'a>, Self> {
        Cased::case(word.into().0.to_lowercase().into())
    }

    fn from_words<'a>(words: Cased<Words<'a>, Self>) -> Cow<'a, str> {
        words.unwrap().join("_")
    }
}

impl Case for ScreamingSnakeCase {
    fn case_word<'a, W: Into<Word<'a>>>(word: W) -> Cased<Word<'a>, Self> {
        Cased::case(word.into().0.to_uppercase().into())
    }

    fn from_words<'a>(words: Cased<Words<'a>, Self>) -> Cow<'a, str> {
        words.unwrap().join("_")
    }
}

/// `MyStruct` -> `my_struct`
pub fn to_snake_case(name: &str) -> String {
    to_words(name).case::<SnakeCase>().format().into_owned()
}

/// `MyStruct` -> `MY_STRUCT`
pub fn to_upper_snake_case(name: &str) -> String {
    to_words(name)
        .case::<ScreamingSnakeCase>()
        .format()
        .into_owned()
}
