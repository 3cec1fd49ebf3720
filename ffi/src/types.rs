//! `#[repr(C)]` types for the FFI boundary.
//!
//! # Design
//! Each type mirrors a core type but uses C-compatible representations:
//! `*mut c_char` instead of `String`, raw pointers instead of `Vec`, and
//! tagged enums with explicit discriminants. Optional strings and timestamps
//! are null when absent; timestamps travel as RFC 3339 strings. Conversion
//! and release helpers live here to keep `lib.rs` focused on the
//! `extern "C"` surface.

use std::ffi::{c_void, CString};
use std::os::raw::c_char;

use miaujuda_core::{
    ApiError, HttpMethod, Item, PetPost, PetPostAndUser, PostStatus, RawObject, Route, User,
};

/// Opaque handle to a `PetClient`. C callers receive a pointer to this
/// and pass it back into every FFI function.
pub struct FfiPetClient {
    pub(crate) inner: miaujuda_core::PetClient,
}

/// Allocate a C string, dropping interior NUL bytes rather than failing.
pub(crate) fn c_string(s: impl Into<String>) -> *mut c_char {
    let mut s = s.into();
    s.retain(|c| c != '\0');
    CString::new(s).unwrap_or_default().into_raw()
}

pub(crate) fn c_string_opt(s: Option<impl Into<String>>) -> *mut c_char {
    match s {
        Some(s) => c_string(s),
        None => std::ptr::null_mut(),
    }
}

/// Release a string produced by `c_string`. Null is ignored.
pub(crate) fn free_c_string(s: *mut c_char) {
    if !s.is_null() {
        drop(unsafe { CString::from_raw(s) });
    }
}

/// Leak a `Vec` as a pointer/length pair; empty vectors become null.
fn into_raw_slice<T>(items: Vec<T>) -> (*mut T, u32) {
    if items.is_empty() {
        return (std::ptr::null_mut(), 0);
    }
    let mut items = items.into_boxed_slice();
    let len = items.len() as u32;
    let ptr = items.as_mut_ptr();
    std::mem::forget(items);
    (ptr, len)
}

/// Reclaim a pointer/length pair produced by `into_raw_slice`.
unsafe fn from_raw_slice<T>(ptr: *mut T, len: u32) -> Vec<T> {
    if ptr.is_null() || len == 0 {
        return Vec::new();
    }
    let slice = std::ptr::slice_from_raw_parts_mut(ptr, len as usize);
    unsafe { Box::from_raw(slice) }.into_vec()
}

// ---------------------------------------------------------------------------
// Enums shared with the caller
// ---------------------------------------------------------------------------

/// HTTP method as a C enum.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FfiHttpMethod {
    Get = 0,
    Post = 1,
    Put = 2,
    Delete = 3,
}

impl From<HttpMethod> for FfiHttpMethod {
    fn from(m: HttpMethod) -> Self {
        match m {
            HttpMethod::Get => FfiHttpMethod::Get,
            HttpMethod::Post => FfiHttpMethod::Post,
            HttpMethod::Put => FfiHttpMethod::Put,
            HttpMethod::Delete => FfiHttpMethod::Delete,
        }
    }
}

/// Named backend route, for the generic get/post functions.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FfiRoute {
    Posts = 0,
    LatestPost = 1,
    Users = 2,
    Auth = 3,
}

impl From<FfiRoute> for Route {
    fn from(route: FfiRoute) -> Self {
        match route {
            FfiRoute::Posts => Route::Posts,
            FfiRoute::LatestPost => Route::LatestPost,
            FfiRoute::Users => Route::Users,
            FfiRoute::Auth => Route::Auth,
        }
    }
}

/// Post status the caller may set.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FfiPostStatus {
    Open = 0,
    Concluded = 1,
}

impl From<FfiPostStatus> for PostStatus {
    fn from(status: FfiPostStatus) -> Self {
        match status {
            FfiPostStatus::Open => PostStatus::Open,
            FfiPostStatus::Concluded => PostStatus::Concluded,
        }
    }
}

/// Error codes returned in `FfiBuildResult` and `FfiPetResult`.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FfiErrorCode {
    Ok = 0,
    NotFound = 1,
    Http = 2,
    Decode = 3,
    Encode = 4,
    Panic = 5,
    NullArg = 6,
    Unauthenticated = 7,
    NothingDeleted = 8,
    InvalidArg = 9,
    Transport = 10,
}

impl FfiErrorCode {
    pub(crate) fn from_error(err: &ApiError) -> (Self, u16) {
        match err {
            ApiError::NotFound => (FfiErrorCode::NotFound, 404),
            ApiError::Http { status, .. } => (FfiErrorCode::Http, *status),
            ApiError::Decode(_) => (FfiErrorCode::Decode, 0),
            ApiError::Encode(_) => (FfiErrorCode::Encode, 0),
            ApiError::Unauthenticated { .. } => (FfiErrorCode::Unauthenticated, 0),
            ApiError::NothingDeleted => (FfiErrorCode::NothingDeleted, 0),
            ApiError::InvalidUrl(_) | ApiError::InvalidArgument(_) => (FfiErrorCode::InvalidArg, 0),
            ApiError::Transport(_) => (FfiErrorCode::Transport, 0),
        }
    }
}

// ---------------------------------------------------------------------------
// Request types
// ---------------------------------------------------------------------------

/// A single HTTP header as a key-value pair of C strings.
#[repr(C)]
pub struct FfiHeader {
    pub key: *mut c_char,
    pub value: *mut c_char,
}

/// An HTTP request described as C-compatible plain data.
///
/// The caller executes it with its own networking stack and passes the
/// response back through the matching `miau_parse_*` function.
#[repr(C)]
pub struct FfiHttpRequest {
    pub method: FfiHttpMethod,
    pub url: *mut c_char,
    pub headers: *mut FfiHeader,
    pub headers_len: u32,
    pub body: *mut c_char,
}

impl FfiHttpRequest {
    fn from_core(req: miaujuda_core::HttpRequest) -> Self {
        let headers = req
            .headers
            .into_iter()
            .map(|(key, value)| FfiHeader {
                key: c_string(key),
                value: c_string(value),
            })
            .collect();
        let (headers, headers_len) = into_raw_slice(headers);
        FfiHttpRequest {
            method: req.method.into(),
            url: c_string(req.url),
            headers,
            headers_len,
            body: c_string_opt(req.body),
        }
    }

    fn free_fields(self) {
        free_c_string(self.url);
        free_c_string(self.body);
        for header in unsafe { from_raw_slice(self.headers, self.headers_len) } {
            free_c_string(header.key);
            free_c_string(header.value);
        }
    }
}

/// Outcome of a `miau_build_*` call.
///
/// On success `error_code` is `Ok` and `request` is non-null. On failure
/// (missing token, bad argument, encoding failure) `request` is null and
/// nothing must be sent.
#[repr(C)]
pub struct FfiBuildResult {
    pub error_code: FfiErrorCode,
    pub error_message: *mut c_char,
    pub request: *mut FfiHttpRequest,
}

impl FfiBuildResult {
    pub(crate) fn from_core(result: Result<miaujuda_core::HttpRequest, ApiError>) -> *mut Self {
        match result {
            Ok(req) => Box::into_raw(Box::new(FfiBuildResult {
                error_code: FfiErrorCode::Ok,
                error_message: std::ptr::null_mut(),
                request: Box::into_raw(Box::new(FfiHttpRequest::from_core(req))),
            })),
            Err(err) => Self::failure(FfiErrorCode::from_error(&err).0, err.to_string()),
        }
    }

    pub(crate) fn failure(error_code: FfiErrorCode, msg: impl Into<String>) -> *mut Self {
        Box::into_raw(Box::new(FfiBuildResult {
            error_code,
            error_message: c_string(msg),
            request: std::ptr::null_mut(),
        }))
    }

    pub(crate) fn null_arg(name: &str) -> *mut Self {
        Self::failure(FfiErrorCode::NullArg, format!("null argument: {name}"))
    }

    pub(crate) fn panic(msg: &str) -> *mut Self {
        Self::failure(FfiErrorCode::Panic, msg)
    }

    pub(crate) unsafe fn free(ptr: *mut Self) {
        let result = unsafe { Box::from_raw(ptr) };
        free_c_string(result.error_message);
        if !result.request.is_null() {
            unsafe { Box::from_raw(result.request) }.free_fields();
        }
    }
}

// ---------------------------------------------------------------------------
// Input types (caller-provided, not freed by us)
// ---------------------------------------------------------------------------

/// An HTTP response described as C-compatible plain data.
///
/// The caller constructs this on the stack after executing a request, then
/// passes a pointer to a `miau_parse_*` function. The FFI layer reads but
/// does not free these fields.
#[repr(C)]
pub struct FfiHttpResponse {
    pub status: u16,
    pub body: *const c_char,
}

/// User registration form. Optional fields may be null; `avatar` must be
/// below 4.
#[repr(C)]
pub struct FfiNewUser {
    pub apple_id: *const c_char,
    pub avatar: u8,
    pub organization_name: *const c_char,
    pub organization_category: *const c_char,
    pub organization_zip_code: *const c_char,
    pub email: *const c_char,
    pub phone: *const c_char,
    pub website: *const c_char,
}

/// Post form. `kind` is "need" or "donation"; `expiration_date` is an
/// RFC 3339 string or null.
#[repr(C)]
pub struct FfiNewPetPost {
    pub user_id: *const c_char,
    pub kind: *const c_char,
    pub title: *const c_char,
    pub description: *const c_char,
    pub item_name: *const c_char,
    pub item_quantity: *const c_char,
    pub item_category: *const c_char,
    pub expiration_date: *const c_char,
}

// ---------------------------------------------------------------------------
// Result types
// ---------------------------------------------------------------------------

/// Tag that tells `miau_free_result` what `FfiPetResult::data` points to.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FfiDataTag {
    None = 0,
    User = 1,
    PetPost = 2,
    PetPostList = 3,
    PetPostAndUser = 4,
    /// `data` is a NUL-terminated JSON object text.
    Json = 5,
}

/// An item exposed to C.
#[repr(C)]
pub struct FfiItem {
    pub id: *mut c_char,
    pub name: *mut c_char,
    pub quantity: *mut c_char,
    pub category: *mut c_char,
    pub expiration_date: *mut c_char,
}

impl FfiItem {
    fn from_core(item: Item) -> Self {
        FfiItem {
            id: c_string_opt(item.id),
            name: c_string(item.name),
            quantity: c_string(item.quantity),
            category: c_string(item.category),
            expiration_date: c_string_opt(item.expiration_date.map(|d| d.to_rfc3339())),
        }
    }

    fn free_fields(&self) {
        free_c_string(self.id);
        free_c_string(self.name);
        free_c_string(self.quantity);
        free_c_string(self.category);
        free_c_string(self.expiration_date);
    }
}

/// A post exposed to C. `status` and `kind` carry the wire strings.
#[repr(C)]
pub struct FfiPetPost {
    pub id: *mut c_char,
    pub created_at: *mut c_char,
    pub user_id: *mut c_char,
    pub status: *mut c_char,
    pub kind: *mut c_char,
    pub title: *mut c_char,
    pub description: *mut c_char,
    pub item: FfiItem,
}

impl FfiPetPost {
    pub(crate) fn from_core(post: PetPost) -> Self {
        FfiPetPost {
            id: c_string(post.id),
            created_at: c_string(post.created_at.to_rfc3339()),
            user_id: c_string(post.user_id),
            status: c_string(post.status),
            kind: c_string(post.kind),
            title: c_string(post.title),
            description: c_string(post.description),
            item: FfiItem::from_core(post.item),
        }
    }

    fn free_fields(&self) {
        free_c_string(self.id);
        free_c_string(self.created_at);
        free_c_string(self.user_id);
        free_c_string(self.status);
        free_c_string(self.kind);
        free_c_string(self.title);
        free_c_string(self.description);
        self.item.free_fields();
    }
}

/// A user exposed to C. Missing contacts are null.
#[repr(C)]
pub struct FfiUser {
    pub id: *mut c_char,
    pub created_at: *mut c_char,
    pub apple_id: *mut c_char,
    pub avatar: u8,
    pub organization_name: *mut c_char,
    pub organization_category: *mut c_char,
    pub organization_zip_code: *mut c_char,
    pub email: *mut c_char,
    pub phone: *mut c_char,
    pub website: *mut c_char,
}

impl FfiUser {
    pub(crate) fn from_core(user: User) -> Self {
        FfiUser {
            id: c_string(user.id),
            created_at: c_string(user.created_at.to_rfc3339()),
            apple_id: c_string(user.apple_id),
            avatar: user.avatar,
            organization_name: c_string(user.organization_name),
            organization_category: c_string(user.organization_category),
            organization_zip_code: c_string(user.organization_zip_code),
            email: c_string_opt(user.email),
            phone: c_string_opt(user.phone),
            website: c_string_opt(user.website),
        }
    }

    fn free_fields(&self) {
        free_c_string(self.id);
        free_c_string(self.created_at);
        free_c_string(self.apple_id);
        free_c_string(self.organization_name);
        free_c_string(self.organization_category);
        free_c_string(self.organization_zip_code);
        free_c_string(self.email);
        free_c_string(self.phone);
        free_c_string(self.website);
    }
}

/// A list of posts exposed to C.
#[repr(C)]
pub struct FfiPetPostList {
    pub items: *mut FfiPetPost,
    pub len: u32,
}

/// The latest post and its author.
#[repr(C)]
pub struct FfiPetPostAndUser {
    pub pet_post: FfiPetPost,
    pub user: FfiUser,
}

/// Result envelope for all parse operations.
///
/// On success `error_code` is `Ok`, `error_message` is null, and `data`
/// points to the parsed payload (tagged by `data_tag`).
/// On failure `error_code` describes the category, `error_message` is a
/// human-readable C string, and `data` is null.
#[repr(C)]
pub struct FfiPetResult {
    pub error_code: FfiErrorCode,
    pub error_message: *mut c_char,
    pub http_status: u16,
    pub data_tag: FfiDataTag,
    pub data: *mut c_void,
}

impl FfiPetResult {
    fn ok(data_tag: FfiDataTag, data: *mut c_void) -> *mut Self {
        Box::into_raw(Box::new(FfiPetResult {
            error_code: FfiErrorCode::Ok,
            error_message: std::ptr::null_mut(),
            http_status: 0,
            data_tag,
            data,
        }))
    }

    pub(crate) fn ok_user(user: User) -> *mut Self {
        let data = Box::into_raw(Box::new(FfiUser::from_core(user)));
        Self::ok(FfiDataTag::User, data as *mut c_void)
    }

    pub(crate) fn ok_pet_post(post: PetPost) -> *mut Self {
        let data = Box::into_raw(Box::new(FfiPetPost::from_core(post)));
        Self::ok(FfiDataTag::PetPost, data as *mut c_void)
    }

    pub(crate) fn ok_pet_post_list(posts: Vec<PetPost>) -> *mut Self {
        let (items, len) = into_raw_slice(posts.into_iter().map(FfiPetPost::from_core).collect());
        let data = Box::into_raw(Box::new(FfiPetPostList { items, len }));
        Self::ok(FfiDataTag::PetPostList, data as *mut c_void)
    }

    pub(crate) fn ok_pet_post_and_user(latest: PetPostAndUser) -> *mut Self {
        let data = Box::into_raw(Box::new(FfiPetPostAndUser {
            pet_post: FfiPetPost::from_core(latest.pet_post),
            user: FfiUser::from_core(latest.user),
        }));
        Self::ok(FfiDataTag::PetPostAndUser, data as *mut c_void)
    }

    /// Raw key/value responses are handed over as JSON text.
    pub(crate) fn ok_json(object: RawObject) -> *mut Self {
        let text = serde_json::Value::Object(object).to_string();
        Self::ok(FfiDataTag::Json, c_string(text) as *mut c_void)
    }

    /// Build an error result from an `ApiError`.
    pub(crate) fn from_error(err: ApiError) -> *mut Self {
        let (error_code, http_status) = FfiErrorCode::from_error(&err);
        Self::failure(error_code, http_status, err.to_string())
    }

    fn failure(error_code: FfiErrorCode, http_status: u16, msg: impl Into<String>) -> *mut Self {
        Box::into_raw(Box::new(FfiPetResult {
            error_code,
            error_message: c_string(msg),
            http_status,
            data_tag: FfiDataTag::None,
            data: std::ptr::null_mut(),
        }))
    }

    /// Build an error result for a null argument.
    pub(crate) fn null_arg(name: &str) -> *mut Self {
        Self::failure(FfiErrorCode::NullArg, 0, format!("null argument: {name}"))
    }

    /// Build an error result for a caught panic.
    pub(crate) fn panic(msg: &str) -> *mut Self {
        Self::failure(FfiErrorCode::Panic, 0, msg)
    }

    /// Release the envelope and whatever `data_tag` says `data` points to.
    pub(crate) unsafe fn free(ptr: *mut Self) {
        let result = unsafe { Box::from_raw(ptr) };
        free_c_string(result.error_message);
        if result.data.is_null() {
            return;
        }
        match result.data_tag {
            FfiDataTag::User => {
                unsafe { Box::from_raw(result.data as *mut FfiUser) }.free_fields();
            }
            FfiDataTag::PetPost => {
                unsafe { Box::from_raw(result.data as *mut FfiPetPost) }.free_fields();
            }
            FfiDataTag::PetPostList => {
                let list = unsafe { Box::from_raw(result.data as *mut FfiPetPostList) };
                for post in unsafe { from_raw_slice(list.items, list.len) } {
                    post.free_fields();
                }
            }
            FfiDataTag::PetPostAndUser => {
                let latest = unsafe { Box::from_raw(result.data as *mut FfiPetPostAndUser) };
                latest.pet_post.free_fields();
                latest.user.free_fields();
            }
            FfiDataTag::Json => free_c_string(result.data as *mut c_char),
            FfiDataTag::None => {}
        }
    }
}
