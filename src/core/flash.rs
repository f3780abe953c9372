//! 闪存提示（flash message）
//!
//! 重定向时把提示写进加密的 `flash` cookie，下一次列表页读取后立即清除。
//! 明文是 form-urlencoded 的 `level=...&message=...`，由 `PrivateCookieJar`
//! 加密，客户端无法伪造或读取。

use axum::response::{IntoResponse, Redirect, Response};
use axum_extra::extract::{
    cookie::{Cookie, SameSite},
    PrivateCookieJar,
};
use url::form_urlencoded;

use super::response::{Notice, NoticeLevel};

pub const FLASH_COOKIE: &str = "flash";

pub fn encode_notice(notice: &Notice) -> String {
    form_urlencoded::Serializer::new(String::new())
        .append_pair("level", notice.level.as_str())
        .append_pair("message", &notice.message)
        .finish()
}

pub fn decode_notice(value: &str) -> Option<Notice> {
    let mut level = None;
    let mut message = None;
    for (key, val) in form_urlencoded::parse(value.as_bytes()) {
        match key.as_ref() {
            "level" => level = NoticeLevel::parse(&val),
            "message" => message = Some(val.into_owned()),
            _ => {}
        }
    }
    Some(Notice {
        level: level?,
        message: message?,
    })
}

fn flash_cookie(value: String) -> Cookie<'static> {
    Cookie::build((FLASH_COOKIE, value))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .build()
}

/// 带提示的重定向
pub struct FlashRedirect {
    jar: PrivateCookieJar,
    to: String,
    notice: Notice,
}

impl FlashRedirect {
    pub fn to(jar: PrivateCookieJar, uri: impl Into<String>, notice: Notice) -> Self {
        Self {
            jar,
            to: uri.into(),
            notice,
        }
    }
}

impl IntoResponse for FlashRedirect {
    fn into_response(self) -> Response {
        let jar = self.jar.add(flash_cookie(encode_notice(&self.notice)));
        (jar, Redirect::to(&self.to)).into_response()
    }
}

/// 取出待显示的提示并从 jar 中删除
///
/// 解密失败的 cookie（被篡改或密钥已更换）视为没有提示。
pub fn take_flash(jar: PrivateCookieJar) -> (PrivateCookieJar, Option<Notice>) {
    match jar.get(FLASH_COOKIE) {
        Some(cookie) => {
            let notice = decode_notice(cookie.value());
            (jar.remove(flash_cookie(String::new())), notice)
        }
        None => (jar, None),
    }
}
