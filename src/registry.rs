//! The third-party libraries the primary project links against.
//!
//! The list order is the build order. Every library only depends on
//! libraries listed before it; nothing checks this, so keep it that way when
//! editing.

use crate::descriptor::{underscore_version, LibraryDescriptor, LibrarySpec};
use crate::error::{Error, Result};
use crate::strategy::{Autotools, CrossCompileConfigure, HeaderOnlyCopy, RawMakefile};

const STATIC_ONLY: &[&str] = &["--disable-shared", "--enable-static"];

const FLAC_ARGS: &[&str] = &[
    "--disable-shared",
    "--enable-static",
    "--disable-xmms-plugin",
    "--disable-cpplibs",
];

const FFMPEG_ARGS: &[&str] = &[
    "--disable-shared",
    "--enable-static",
    "--enable-gpl",
    "--enable-small",
    "--disable-pthreads",
    "--disable-programs",
    "--disable-doc",
    "--disable-avdevice",
    "--disable-swresample",
    "--disable-swscale",
    "--disable-postproc",
    "--disable-avfilter",
    "--disable-network",
    "--disable-encoders",
    "--disable-protocols",
    "--disable-outdevs",
    "--disable-filters",
];

// HTTP only, no TLS, no optional protocols.
const CURL_ARGS: &[&str] = &[
    "--disable-shared",
    "--enable-static",
    "--disable-debug",
    "--enable-http",
    "--enable-ipv6",
    "--disable-ftp",
    "--disable-file",
    "--disable-ldap",
    "--disable-ldaps",
    "--disable-rtsp",
    "--disable-proxy",
    "--disable-dict",
    "--disable-telnet",
    "--disable-tftp",
    "--disable-pop3",
    "--disable-imap",
    "--disable-smtp",
    "--disable-gopher",
    "--disable-manual",
    "--disable-threaded-resolver",
    "--disable-verbose",
    "--disable-sspi",
    "--disable-crypto-auth",
    "--disable-ntlm-wb",
    "--disable-tls-srp",
    "--disable-cookies",
    "--without-ssl",
    "--without-gnutls",
    "--without-nss",
    "--without-libssh2",
];

const BOOST_URL: &str =
    "http://netcologne.dl.sourceforge.net/project/boost/boost/1.55.0/boost_1_55_0.tar.bz2";

/// Build the ordered library list. Fails only if an entry is malformed.
pub fn thirdparty_libraries() -> Result<Vec<LibraryDescriptor>> {
    let zlib = RawMakefile::new("win32/Makefile.gcc")
        .var("INCLUDE_PATH", "include")
        .var("LIBRARY_PATH", "lib")
        .var("BINARY_PATH", "bin")
        .var("SHARED_MODE", "1");

    let boost_version = underscore_version("boost_1_55_0", "boost")
        .ok_or_else(|| Error::config("boost archive name carries no version"))?;

    Ok(vec![
        LibraryDescriptor::new(
            "http://downloads.xiph.org/releases/ogg/libogg-1.3.2.tar.xz",
            "5c3a34309d8b98640827e5d0991a4015",
            "lib/libogg.a",
            Autotools::with_args(STATIC_ONLY).into(),
        )?,
        LibraryDescriptor::new(
            "http://downloads.xiph.org/releases/vorbis/libvorbis-1.3.4.tar.xz",
            "55f2288055e44754275a17c9a2497391",
            "lib/libvorbis.a",
            Autotools::with_args(STATIC_ONLY).into(),
        )?,
        LibraryDescriptor::new(
            "http://downloads.xiph.org/releases/opus/opus-1.1.tar.gz",
            "c5a8cf7c0b066759542bc4ca46817ac6",
            "lib/libopus.a",
            Autotools::with_args(STATIC_ONLY).into(),
        )?,
        LibraryDescriptor::new(
            "http://downloads.xiph.org/releases/flac/flac-1.3.1.tar.xz",
            "b9922c9a0378c88d3e901b234f852698",
            "lib/libFLAC.a",
            Autotools::with_args(FLAC_ARGS).into(),
        )?,
        LibraryDescriptor::new(
            "http://zlib.net/zlib-1.2.8.tar.xz",
            "28f1205d8dd2001f26fec1e8c2cebe37",
            "lib/libz.a",
            zlib.into(),
        )?,
        LibraryDescriptor::new(
            "ftp://ftp.mars.org/pub/mpeg/libid3tag-0.15.1b.tar.gz",
            "e5808ad997ba32c498803822078748c3",
            "lib/libid3tag.a",
            Autotools::with_args(STATIC_ONLY).autogen().into(),
        )?,
        LibraryDescriptor::new(
            "http://ffmpeg.org/releases/ffmpeg-2.5.tar.bz2",
            "4346fe710cc6bdd981f6534d2420d1ab",
            "lib/libavcodec.a",
            CrossCompileConfigure::with_args(FFMPEG_ARGS).into(),
        )?,
        LibraryDescriptor::new(
            "http://curl.haxx.se/download/curl-7.39.0.tar.lzma",
            "e9aa6dec29920eba8ef706ea5823bad7",
            "lib/libcurl.a",
            Autotools::with_args(CURL_ARGS).into(),
        )?,
        LibraryDescriptor::from_spec(
            LibrarySpec::new(
                BOOST_URL,
                "d6eef4b4cacb2183f2bf265a5a03a354",
                "include/boost/version.hpp",
                HeaderOnlyCopy::new("boost", ".hpp").into(),
            )
            .named("boost", boost_version),
        )?,
    ])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::checksum::ChecksumKind;
    use crate::descriptor::ArchiveFormat;
    use crate::strategy::BuildStrategy;
    use std::collections::HashSet;
    use std::path::Path;

    #[test]
    fn registry_is_well_formed() {
        let libs = thirdparty_libraries().unwrap();
        let names: Vec<_> = libs.iter().map(|d| d.display_name()).collect();
        assert_eq!(
            names,
            [
                "libogg-1.3.2",
                "libvorbis-1.3.4",
                "opus-1.1",
                "flac-1.3.1",
                "zlib-1.2.8",
                "libid3tag-0.15.1b",
                "ffmpeg-2.5",
                "curl-7.39.0",
                "boost-1.55.0",
            ]
        );
    }

    #[test]
    fn checksums_match_the_pinned_algorithm() {
        for d in thirdparty_libraries().unwrap() {
            assert!(
                ChecksumKind::PINNED.normalize(d.checksum()).is_ok(),
                "{}",
                d.display_name()
            );
        }
    }

    #[test]
    fn archive_names_are_unique() {
        let libs = thirdparty_libraries().unwrap();
        let bases: HashSet<_> = libs.iter().map(|d| d.archive_base()).collect();
        assert_eq!(bases.len(), libs.len());
    }

    #[test]
    fn vorbis_comes_after_ogg() {
        let libs = thirdparty_libraries().unwrap();
        let pos = |name: &str| libs.iter().position(|d| d.name() == name).unwrap();
        assert!(pos("libogg") < pos("libvorbis"));
        assert!(pos("libogg") < pos("flac"));
    }

    #[test]
    fn special_cases() {
        let libs = thirdparty_libraries().unwrap();
        let by_name = |name: &str| libs.iter().find(|d| d.name() == name).unwrap();

        let boost = by_name("boost");
        assert_eq!(boost.archive_base(), "boost_1_55_0");
        assert_eq!(boost.sentinel(), Path::new("include/boost/version.hpp"));
        assert!(matches!(boost.strategy(), BuildStrategy::HeaderOnlyCopy(_)));

        assert!(by_name("libid3tag").strategy().needs_bootstrap());
        assert_eq!(by_name("curl").format(), ArchiveFormat::TarLzma);
        assert!(matches!(
            by_name("ffmpeg").strategy(),
            BuildStrategy::CrossCompileConfigure(_)
        ));
        assert!(matches!(by_name("zlib").strategy(), BuildStrategy::RawMakefile(_)));
    }
}
