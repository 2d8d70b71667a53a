use mime::Mime;
use once_cell::sync::Lazy;
use percent_encoding::{utf8_percent_encode, AsciiSet, CONTROLS};
use rand::random;
use regex::Regex;
use reqpool_http::{
    header::{HeaderMap, HeaderValue, IntoHeaderName, CONTENT_TYPE},
    ResponseError, ResponseErrorKind,
};
use std::{
    fmt::Write,
    fs, io,
    path::Path,
};

/// A multipart/form-data body under construction.
///
/// Parts are emitted in insertion order, each in its own boundary-delimited
/// section, followed by a single terminating boundary marker.
#[derive(Debug)]
pub struct Multipart {
    boundary: Box<str>,
    fields: Vec<(Box<str>, Part)>,
}

impl Default for Multipart {
    #[inline]
    fn default() -> Self {
        Self::new()
    }
}

impl Multipart {
    /// Creates an empty form with a freshly generated boundary.
    #[inline]
    pub fn new() -> Self {
        Self {
            boundary: gen_boundary(),
            fields: Vec::new(),
        }
    }

    pub(super) fn boundary(&self) -> &str {
        &self.boundary
    }

    /// Appends a named part to the form.
    #[inline]
    #[must_use]
    pub fn add_part(mut self, name: impl Into<Box<str>>, part: Part) -> Self {
        self.fields.push((name.into(), part));
        self
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Encodes the whole form into one in-memory payload.
    ///
    /// Fails when a part violates its size limit.
    pub(super) fn encode(&self) -> Result<Vec<u8>, ResponseError> {
        let mut body = Vec::new();
        for (name, part) in &self.fields {
            if !part.is_valid() {
                return Err(ResponseError::builder_with_msg(
                    ResponseErrorKind::InvalidRequestResponse,
                    format!(
                        "multipart part {:?} ({} bytes) exceeds its size limit",
                        name,
                        part.body.len(),
                    ),
                )
                .build());
            }
            body.extend_from_slice(b"--");
            body.extend_from_slice(self.boundary.as_bytes());
            body.extend_from_slice(b"\r\n");
            body.extend_from_slice(&encode_headers(name, &part.meta));
            body.extend_from_slice(b"\r\n\r\n");
            body.extend_from_slice(&part.body);
            body.extend_from_slice(b"\r\n");
        }
        body.extend_from_slice(b"--");
        body.extend_from_slice(self.boundary.as_bytes());
        body.extend_from_slice(b"--\r\n");
        Ok(body)
    }
}

/// One named attachment within a multipart form.
#[derive(Debug)]
pub struct Part {
    meta: PartMetadata,
    body: Vec<u8>,
}

impl Part {
    /// A part carrying UTF-8 text.
    #[inline]
    #[must_use]
    pub fn text(value: impl Into<String>) -> Self {
        Self {
            meta: Default::default(),
            body: value.into().into_bytes(),
        }
    }

    /// A part carrying raw bytes.
    #[inline]
    #[must_use]
    pub fn bytes(value: impl Into<Vec<u8>>) -> Self {
        Self {
            meta: Default::default(),
            body: value.into(),
        }
    }

    /// A part loaded from a file, with the content type guessed from the
    /// extension and the file name recorded in the part metadata.
    pub fn file_path(path: impl AsRef<Path>) -> io::Result<Self> {
        let path = path.as_ref();
        let body = fs::read(path)?;
        let mut metadata =
            PartMetadata::default().mime(mime_guess::from_path(path).first_or_octet_stream());
        if let Some(file_name) = path.file_name() {
            metadata = metadata.file_name(file_name.to_string_lossy().into_owned());
        }
        Ok(Self::bytes(body).metadata(metadata))
    }

    /// Replaces the part's metadata.
    #[inline]
    #[must_use]
    pub fn metadata(mut self, metadata: PartMetadata) -> Self {
        self.meta = metadata;
        self
    }

    /// Whether the part body fits within its optional size limit.
    #[inline]
    pub fn is_valid(&self) -> bool {
        match self.meta.max_size {
            Some(max_size) => self.body.len() <= max_size,
            None => true,
        }
    }
}

/// Metadata attached to one multipart form part.
#[derive(Debug, Default)]
pub struct PartMetadata {
    headers: HeaderMap,
    file_name: Option<Box<str>>,
    max_size: Option<usize>,
}

impl PartMetadata {
    /// Sets the part's content type.
    #[inline]
    #[must_use]
    pub fn mime(self, mime: Mime) -> Self {
        self.add_header(CONTENT_TYPE, HeaderValue::from_str(mime.as_ref()).unwrap())
    }

    /// Adds an arbitrary header to the part's section.
    #[inline]
    #[must_use]
    pub fn add_header(mut self, name: impl IntoHeaderName, value: impl Into<HeaderValue>) -> Self {
        self.headers.insert(name, value.into());
        self
    }

    /// Records the file name announced in the content disposition.
    #[inline]
    #[must_use]
    pub fn file_name(mut self, file_name: impl Into<Box<str>>) -> Self {
        self.file_name = Some(file_name.into());
        self
    }

    /// Caps the part body at `max_size` bytes; encoding fails beyond it.
    #[inline]
    #[must_use]
    pub fn max_size(mut self, max_size: usize) -> Self {
        self.max_size = Some(max_size);
        self
    }
}

fn gen_boundary() -> Box<str> {
    let mut boundary = String::with_capacity(32);
    write!(boundary, "{:016x}{:016x}", random::<u64>(), random::<u64>()).unwrap();
    boundary.into()
}

fn encode_headers(name: &str, meta: &PartMetadata) -> Vec<u8> {
    let mut buf = b"content-disposition: form-data; ".to_vec();
    buf.extend_from_slice(format_parameter("name", name).as_bytes());
    if let Some(file_name) = meta.file_name.as_deref() {
        buf.extend_from_slice(b"; ");
        buf.extend_from_slice(format_file_name(file_name).as_bytes());
    }
    for (header_name, header_value) in meta.headers.iter() {
        buf.extend_from_slice(b"\r\n");
        buf.extend_from_slice(header_name.as_str().as_bytes());
        buf.extend_from_slice(b": ");
        buf.extend_from_slice(header_value.as_bytes());
    }
    buf
}

fn format_file_name(file_name: &str) -> String {
    static REGEX: Lazy<Regex> = Lazy::new(|| Regex::new("\\\\|\"|\r|\n").unwrap());
    let mut formatted = String::from("filename=\"");
    let mut last_match = 0;
    for m in REGEX.find_iter(file_name) {
        formatted.push_str(&file_name[last_match..m.start()]);
        match &file_name[m.start()..m.end()] {
            "\\" => formatted.push_str("\\\\"),
            "\"" => formatted.push_str("\\\""),
            "\r" => formatted.push_str("\\\r"),
            "\n" => formatted.push_str("\\\n"),
            _ => unreachable!(),
        }
        last_match = m.end();
    }
    formatted.push_str(&file_name[last_match..]);
    formatted.push('"');
    formatted
}

pub(super) const PATH_SEGMENT_ENCODE_SET: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'<')
    .add(b'>')
    .add(b'`')
    .add(b'#')
    .add(b'?')
    .add(b'{')
    .add(b'}')
    .add(b'/')
    .add(b'%');

fn format_parameter(name: &str, value: &str) -> String {
    let legal_value: String = utf8_percent_encode(value, PATH_SEGMENT_ENCODE_SET).collect();
    if legal_value.len() == value.len() {
        format!("{}=\"{}\"", name, value)
    } else {
        format!("{}*=utf-8''{}", name, legal_value)
    }
}
