// ─── URL Stream Handlers ───
// Scheme handlers are looked up by walking the `java.protocol.handler.pkgs`
// list and probing `<prefix>.<scheme>.Handler` in the ambient scope.

use std::fmt;
use std::io::{self, Read};
use std::net::IpAddr;

use reqwest::Url;

/// Name of the property listing handler package prefixes, `|`-separated.
pub const HANDLER_PACKAGES_PROPERTY: &str = "java.protocol.handler.pkgs";
/// Package probed after every configured prefix.
pub const DEFAULT_HANDLER_PACKAGE: &str = "platform.protocol";
pub const HANDLER_PACKAGE_SEPARATOR: char = '|';

/// An open connection to a URL.
pub trait UrlConnection: Send + fmt::Debug {
    fn url(&self) -> &Url;

    /// Stream the resource content.
    fn input_stream(&mut self) -> io::Result<Box<dyn Read + Send + '_>>;
}

/// Handler for a single URL scheme.
pub trait UrlStreamHandler: Send + Sync + fmt::Debug {
    fn open_connection(&self, url: &Url) -> io::Result<Box<dyn UrlConnection>>;

    /// Resolved host address for `url`, `None` when not applicable.
    fn host_address(&self, _url: &Url) -> Option<IpAddr> {
        None
    }
}

/// Class name probed for `scheme` under package `prefix`.
pub fn handler_class_name(prefix: &str, scheme: &str) -> String {
    format!("{prefix}.{scheme}.Handler")
}

/// Split a handler package list into its non-empty prefixes.
pub fn split_handler_packages(value: &str) -> Vec<&str> {
    value
        .split(HANDLER_PACKAGE_SEPARATOR)
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .collect()
}

/// Put `prefix` first in a handler package list.
///
/// Any earlier occurrence is dropped so the prefix appears exactly once; the
/// remaining entries keep their relative order.
pub fn prepend_handler_package(existing: Option<&str>, prefix: &str) -> String {
    let mut packages = vec![prefix];
    if let Some(existing) = existing {
        packages.extend(
            split_handler_packages(existing)
                .into_iter()
                .filter(|p| *p != prefix),
        );
    }
    packages.join("|")
}
