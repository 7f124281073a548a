//! Tenant-scoped URL composition.
//!
//! Every API call targets `https://{tenant}.egnyte.com/` followed by a
//! server-relative path such as `/pubapi/v1/fs/Shared/report.pdf`. Resource
//! identifiers routinely contain `[` and `]`, which some transports leave
//! unescaped, so composed URLs always carry them as `%5B`/`%5D`.

use percent_encoding::{AsciiSet, CONTROLS, utf8_percent_encode};
use url::Url;

use crate::{Error, Result};

/// Default authority template; `{tenant}` is replaced by the tenant name.
pub const DEFAULT_AUTHORITY_TEMPLATE: &str = "https://{tenant}.egnyte.com/";

const TENANT_PLACEHOLDER: &str = "{tenant}";

/// Characters escaped when a raw path is appended to the authority.
///
/// Paths are taken literally: a `%` in a file name is sent as `%25`.
const PATH_ESCAPE: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'%')
    .add(b'"')
    .add(b'#')
    .add(b'<')
    .add(b'>')
    .add(b'?')
    .add(b'`')
    .add(b'{')
    .add(b'}')
    .add(b'[')
    .add(b']');

/// Builds absolute request URLs for one tenant.
///
/// # Example
///
/// ```
/// use egnyte_core::UrlComposer;
///
/// let composer = UrlComposer::new("acme").expect("tenant");
/// let no_query: &[(&str, &str)] = &[];
/// let url = composer
///     .compose("/pubapi/v1/fs/Shared/file[1].txt", no_query)
///     .expect("url");
/// assert_eq!(
///     url.as_str(),
///     "https://acme.egnyte.com/pubapi/v1/fs/Shared/file%5B1%5D.txt"
/// );
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UrlComposer {
    base: Url,
}

impl UrlComposer {
    /// Composer for `tenant` on the default authority.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidArgument`] if `tenant` is blank.
    pub fn new(tenant: &str) -> Result<Self> {
        Self::with_template(DEFAULT_AUTHORITY_TEMPLATE, tenant)
    }

    /// Composer for `tenant` on a custom authority template.
    ///
    /// The template may omit `{tenant}` (e.g. a test server address); the
    /// tenant name is still required.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidArgument`] if `tenant` is blank, or
    /// [`Error::InvalidUrl`] if the resulting authority is not a URL.
    pub fn with_template(template: &str, tenant: &str) -> Result<Self> {
        if tenant.trim().is_empty() {
            return Err(Error::blank_argument("tenant"));
        }

        let mut authority = template.replace(TENANT_PLACEHOLDER, tenant.trim());
        if !authority.ends_with('/') {
            authority.push('/');
        }

        Ok(Self {
            base: Url::parse(&authority)?,
        })
    }

    /// The tenant authority, always ending with `/`.
    #[must_use]
    pub fn base_url(&self) -> &Url {
        &self.base
    }

    /// Append `path` and `query` to the tenant authority.
    ///
    /// Query pairs keep the order they are given in.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidUrl`] if the result cannot be parsed.
    pub fn compose<K, V>(&self, path: &str, query: &[(K, V)]) -> Result<Url>
    where
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let relative = path.trim_start_matches('/');
        let escaped = utf8_percent_encode(relative, PATH_ESCAPE);
        let mut url = Url::parse(&format!("{}{escaped}", self.base))?;

        if !query.is_empty() {
            let mut pairs = url.query_pairs_mut();
            for (name, value) in query {
                pairs.append_pair(name.as_ref(), value.as_ref());
            }
        }

        Ok(escape_brackets(url))
    }
}

/// Compose a URL in one call.
///
/// # Errors
///
/// See [`UrlComposer::with_template`] and [`UrlComposer::compose`].
pub fn compose<K, V>(template: &str, tenant: &str, path: &str, query: &[(K, V)]) -> Result<Url>
where
    K: AsRef<str>,
    V: AsRef<str>,
{
    UrlComposer::with_template(template, tenant)?.compose(path, query)
}

/// Replace literal `[`/`]` in the path and query with `%5B`/`%5D`.
///
/// Idempotent: already escaped brackets are left untouched. The host is
/// never rewritten, so IPv6 literals survive.
#[must_use]
pub fn escape_brackets(mut url: Url) -> Url {
    if url.path().contains(['[', ']']) {
        let path = replace_brackets(url.path());
        url.set_path(&path);
    }

    if let Some(query) = url.query().filter(|q| q.contains(['[', ']'])) {
        let query = replace_brackets(query);
        url.set_query(Some(&query));
    }

    url
}

fn replace_brackets(value: &str) -> String {
    value.replace('[', "%5B").replace(']', "%5D")
}
