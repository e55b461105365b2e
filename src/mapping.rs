//! Maps a [`Book`] onto whatever property schema the target database declares.
//!
//! Each semantic field has a fixed, ordered list of property names it answers
//! to. The first schema entry whose name is on that list wins, and its declared
//! type decides how the value is encoded. The title is the exception: it
//! always goes to the database's `title` property when there is one.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::book::{Book, MAX_RATING};
use crate::notion::model::{
    CreatePageRequest, DateValue, FileObject, Parent, PropertyType, PropertyValue, RichText,
    Schema, SchemaProperty, SelectOption,
};

/// Label written to the category property of every page.
pub const CATEGORY_LABEL: &str = "책";

/// Upper bound on the characters of a single rich text block.
const RICH_TEXT_LIMIT: usize = 2000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldKind {
    Title,
    Authors,
    Publisher,
    Isbn,
    Url,
    Date,
    Category,
    Rating,
    Description,
}

impl FieldKind {
    pub const ALL: [FieldKind; 9] = [
        FieldKind::Title,
        FieldKind::Authors,
        FieldKind::Publisher,
        FieldKind::Isbn,
        FieldKind::Url,
        FieldKind::Date,
        FieldKind::Category,
        FieldKind::Rating,
        FieldKind::Description,
    ];

    /// Property names this field answers to. Matching is exact and case-sensitive.
    pub fn candidates(self) -> &'static [&'static str] {
        match self {
            FieldKind::Title => &["이름", "제목", "책 제목", "Name", "name", "Title", "title"],
            FieldKind::Authors => &["저자", "작가", "Author", "author", "Authors", "authors"],
            FieldKind::Publisher => &["출판사", "Publisher", "publisher"],
            FieldKind::Isbn => &["ISBN", "isbn", "ISBN13"],
            FieldKind::Url => &["URL", "url", "링크", "Link", "link"],
            FieldKind::Date => &["출간일", "출판일", "Date", "date", "날짜"],
            FieldKind::Category => &["유형", "타입", "Type", "type", "카테고리", "Category"],
            FieldKind::Rating => &["평점", "별점", "Rating", "rating"],
            FieldKind::Description => &["소개", "책소개", "설명", "Description", "description"],
        }
    }

    /// Finds the schema entry this field writes to.
    pub fn resolve(self, schema: &Schema) -> Option<&SchemaProperty> {
        let candidates = self.candidates();
        let by_name = |prop: &&SchemaProperty| candidates.contains(&prop.name.as_str());

        match self {
            // every database has exactly one title property, whatever it is called
            FieldKind::Title => schema
                .iter()
                .find(|p| p.kind == PropertyType::Title)
                .or_else(|| schema.iter().find(by_name)),
            _ => schema.iter().find(by_name),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum FieldOutcome {
    Mapped {
        property: String,
        value: PropertyValue,
    },
    /// No schema property carries any of the field's names.
    NoMatch,
    /// A property matched but the book has no usable value for it.
    Empty { property: String },
    /// A property matched but its declared type has no encoding for this field.
    Unsupported {
        property: String,
        #[serde(rename = "type")]
        kind: PropertyType,
    },
}

enum Encoded {
    Value(PropertyValue),
    Empty,
    Unsupported,
}

pub fn map_field(kind: FieldKind, book: &Book, schema: &Schema) -> FieldOutcome {
    let Some(prop) = kind.resolve(schema) else {
        return FieldOutcome::NoMatch;
    };
    let property = prop.name.clone();

    match encode(kind, book, &prop.kind) {
        Encoded::Value(value) => FieldOutcome::Mapped { property, value },
        Encoded::Empty => FieldOutcome::Empty { property },
        Encoded::Unsupported => FieldOutcome::Unsupported {
            property,
            kind: prop.kind.clone(),
        },
    }
}

fn encode(kind: FieldKind, book: &Book, declared: &PropertyType) -> Encoded {
    use PropertyType as T;

    match kind {
        FieldKind::Title => encode_text(Some(book.title.as_str()), declared, true),
        FieldKind::Authors => {
            let authors = book
                .authors
                .iter()
                .map(|a| a.trim())
                .filter(|a| !a.is_empty())
                .collect::<Vec<_>>();
            match declared {
                T::RichText | T::MultiSelect | T::Select if authors.is_empty() => Encoded::Empty,
                T::RichText => Encoded::Value(PropertyValue::RichText(RichText::plain(
                    authors.join(", "),
                ))),
                T::MultiSelect => Encoded::Value(PropertyValue::MultiSelect(
                    authors.into_iter().map(SelectOption::named).collect(),
                )),
                T::Select => Encoded::Value(PropertyValue::Select(SelectOption::named(authors[0]))),
                _ => Encoded::Unsupported,
            }
        }
        FieldKind::Publisher => match declared {
            T::Select => match present(book.publisher.as_deref()) {
                Some(publisher) => {
                    Encoded::Value(PropertyValue::Select(SelectOption::named(publisher)))
                }
                None => Encoded::Empty,
            },
            _ => encode_text(book.publisher.as_deref(), declared, false),
        },
        FieldKind::Isbn => match declared {
            T::Number => match present(book.isbn.as_deref()).and_then(isbn_number) {
                Some(number) => Encoded::Value(PropertyValue::Number(number)),
                None => Encoded::Empty,
            },
            _ => encode_text(book.isbn.as_deref(), declared, false),
        },
        FieldKind::Url => match declared {
            T::Url => match present(book.url.as_deref()) {
                Some(url) => Encoded::Value(PropertyValue::Url(url.to_owned())),
                None => Encoded::Empty,
            },
            _ => encode_text(book.url.as_deref(), declared, false),
        },
        FieldKind::Date => {
            let date = present(book.published_date.as_deref()).map(date_part);
            match declared {
                T::Date => match date.filter(|d| is_iso_date(d)) {
                    Some(start) => Encoded::Value(PropertyValue::Date(DateValue {
                        start: start.to_owned(),
                    })),
                    None => Encoded::Empty,
                },
                _ => encode_text(date, declared, false),
            }
        }
        FieldKind::Category => match declared {
            T::Select => Encoded::Value(PropertyValue::Select(SelectOption::named(CATEGORY_LABEL))),
            T::MultiSelect => Encoded::Value(PropertyValue::MultiSelect(vec![
                SelectOption::named(CATEGORY_LABEL),
            ])),
            _ => Encoded::Unsupported,
        },
        FieldKind::Rating => match (declared, book.rating) {
            (T::Number | T::Select, None) => Encoded::Empty,
            (T::Number, Some(rating)) => {
                Encoded::Value(PropertyValue::Number(i64::from(rating.min(MAX_RATING))))
            }
            (T::Select, Some(0)) => Encoded::Empty,
            (T::Select, Some(rating)) => Encoded::Value(PropertyValue::Select(
                SelectOption::named("★".repeat(usize::from(rating.min(MAX_RATING)))),
            )),
            _ => Encoded::Unsupported,
        },
        FieldKind::Description => match declared {
            T::RichText => encode_text(book.description.as_deref(), declared, false),
            _ => Encoded::Unsupported,
        },
    }
}

/// Text encodings shared by most fields: `rich_text` always, `title` when allowed.
fn encode_text(value: Option<&str>, declared: &PropertyType, allow_title: bool) -> Encoded {
    let wrap: fn(Vec<RichText>) -> PropertyValue = match declared {
        PropertyType::RichText => PropertyValue::RichText,
        PropertyType::Title if allow_title => PropertyValue::Title,
        _ => return Encoded::Unsupported,
    };
    match present(value) {
        Some(text) => Encoded::Value(wrap(RichText::plain(truncate_chars(text, RICH_TEXT_LIMIT)))),
        None => Encoded::Empty,
    }
}

fn present(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

/// `2014-05-19T00:00:00.000+09:00` → `2014-05-19`.
fn date_part(value: &str) -> &str {
    value.split('T').next().unwrap_or(value)
}

fn is_iso_date(value: &str) -> bool {
    chrono::NaiveDate::parse_from_str(value, "%Y-%m-%d").is_ok()
}

/// Some providers return `"<isbn10> <isbn13>"`; the last token is the one kept.
fn isbn_number(isbn: &str) -> Option<i64> {
    isbn.split_whitespace().last()?.replace('-', "").parse().ok()
}

fn truncate_chars(text: &str, limit: usize) -> String {
    match text.char_indices().nth(limit) {
        Some((end, _)) => text[..end].to_owned(),
        None => text.to_owned(),
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct FieldReport {
    pub field: FieldKind,
    #[serde(flatten)]
    pub outcome: FieldOutcome,
}

/// A page-create request plus how each field was (or was not) placed.
#[derive(Debug, Clone, Serialize)]
pub struct PageDraft {
    pub request: CreatePageRequest,
    pub fields: Vec<FieldReport>,
}

pub fn build_page(book: &Book, schema: &Schema, database_id: &str) -> PageDraft {
    let mut properties = BTreeMap::new();
    let mut fields = Vec::with_capacity(FieldKind::ALL.len());

    for kind in FieldKind::ALL {
        let outcome = map_field(kind, book, schema);
        match &outcome {
            FieldOutcome::Mapped { property, value } => {
                if properties.contains_key(property) {
                    tracing::debug!(field = ?kind, %property, "property already set; keeping first value");
                } else {
                    properties.insert(property.clone(), value.clone());
                }
            }
            FieldOutcome::NoMatch => {
                tracing::debug!(field = ?kind, "no matching property in schema");
            }
            FieldOutcome::Empty { property } => {
                tracing::debug!(field = ?kind, %property, "book has no value for property");
            }
            FieldOutcome::Unsupported { property, kind: declared } => {
                tracing::debug!(field = ?kind, %property, %declared, "property type not supported for field");
            }
        }
        fields.push(FieldReport {
            field: kind,
            outcome,
        });
    }

    let thumbnail = present(book.thumbnail.as_deref());
    let request = CreatePageRequest {
        parent: Parent {
            database_id: database_id.to_owned(),
        },
        properties,
        cover: thumbnail.map(FileObject::external),
        icon: thumbnail.map(FileObject::external),
    };

    PageDraft { request, fields }
}
