//! C-ABI wrapper around `miaujuda-core`.
//!
//! # Overview
//! Exposes every pet-post API operation through `extern "C"` functions so the
//! native mobile app can build requests, execute them with its own networking
//! stack, and hand the responses back for parsing, without linking an async
//! runtime or serde.
//!
//! # Design
//! - Every `extern "C"` function wraps its body in `catch_unwind` so panics
//!   never cross the FFI boundary.
//! - Per-operation `miau_build_*` / `miau_parse_*` mirrors the core API 1:1.
//! - Builders return an `FfiBuildResult`: a missing token or a bad argument
//!   comes back as an error code with a null request, never as a request
//!   that should not be sent.
//! - A single `FfiPetResult` envelope with `FfiDataTag` + `void* data`
//!   conveys parse payloads and errors uniformly.
//! - The C caller owns all returned pointers and must call the matching
//!   `miau_free_*` function to release them.

pub mod types;

use std::ffi::CStr;
use std::os::raw::c_char;
use std::panic::{catch_unwind, AssertUnwindSafe};

use chrono::{DateTime, Utc};
use miaujuda_core::{
    ApiError, ClientConfig, HttpResponse, NewItem, NewPetPost, NewUser, PetClient, PostKind,
    PostStatus, RawObject, Session,
};

use types::*;

/// Copy a caller-owned C string. Null reads as `None`; invalid UTF-8 is
/// replaced rather than rejected.
fn read_string(ptr: *const c_char) -> Option<String> {
    if ptr.is_null() {
        return None;
    }
    Some(unsafe { CStr::from_ptr(ptr) }.to_string_lossy().into_owned())
}

/// Like `read_string`, but an empty string also reads as `None`.
fn read_optional(ptr: *const c_char) -> Option<String> {
    read_string(ptr).filter(|s| !s.is_empty())
}

/// Run a builder against a non-null client, catching panics.
fn build_with<F>(client: *const FfiPetClient, context: &str, f: F) -> *mut FfiBuildResult
where
    F: FnOnce(&PetClient) -> *mut FfiBuildResult,
{
    catch_unwind(AssertUnwindSafe(|| {
        if client.is_null() {
            return FfiBuildResult::null_arg("client");
        }
        let client = unsafe { &*client };
        f(&client.inner)
    }))
    .unwrap_or_else(|_| FfiBuildResult::panic(&format!("panic in {context}")))
}

/// Convert the caller's response, run `parse`, and wrap the outcome.
fn parse_with<T, P, W>(
    client: *const FfiPetClient,
    response: *const FfiHttpResponse,
    context: &str,
    parse: P,
    wrap: W,
) -> *mut FfiPetResult
where
    P: FnOnce(&PetClient, HttpResponse) -> Result<T, ApiError>,
    W: FnOnce(T) -> *mut FfiPetResult,
{
    catch_unwind(AssertUnwindSafe(|| {
        if client.is_null() {
            return FfiPetResult::null_arg("client");
        }
        if response.is_null() {
            return FfiPetResult::null_arg("response");
        }
        let client = unsafe { &*client };
        let resp = unsafe { &*response };
        match parse(&client.inner, ffi_response_to_core(resp)) {
            Ok(value) => wrap(value),
            Err(e) => FfiPetResult::from_error(e),
        }
    }))
    .unwrap_or_else(|_| FfiPetResult::panic(&format!("panic in {context}")))
}

/// Convert an `FfiHttpResponse` to a core `HttpResponse`. A null body is an
/// empty body.
fn ffi_response_to_core(resp: &FfiHttpResponse) -> HttpResponse {
    HttpResponse::new(resp.status, read_string(resp.body).unwrap_or_default())
}

// ---------------------------------------------------------------------------
// Client lifecycle
// ---------------------------------------------------------------------------

/// Create a new client bound to `base_url`, holding `token` (may be null
/// for an anonymous session).
///
/// Returns null if `base_url` is null or not a usable base address, or if an
/// internal panic occurs. Free with `miau_client_free`.
#[unsafe(no_mangle)]
pub extern "C" fn miau_client_new(
    base_url: *const c_char,
    token: *const c_char,
) -> *mut FfiPetClient {
    catch_unwind(|| {
        let Some(url) = read_string(base_url) else {
            return std::ptr::null_mut();
        };
        let Ok(config) = ClientConfig::new(&url) else {
            return std::ptr::null_mut();
        };
        let session = read_optional(token).map(Session::with_token).unwrap_or_default();
        let client = PetClient::new(config, session);
        Box::into_raw(Box::new(FfiPetClient { inner: client }))
    })
    .unwrap_or(std::ptr::null_mut())
}

/// Create a copy of `client` holding `token`, typically right after a
/// successful authentication. The original client is left untouched.
///
/// Returns null if `client` is null. Free with `miau_client_free`.
#[unsafe(no_mangle)]
pub extern "C" fn miau_client_with_token(
    client: *const FfiPetClient,
    token: *const c_char,
) -> *mut FfiPetClient {
    catch_unwind(|| {
        if client.is_null() {
            return std::ptr::null_mut();
        }
        let client = unsafe { &*client };
        let session = read_optional(token).map(Session::with_token).unwrap_or_default();
        let inner = client.inner.with_session(session);
        Box::into_raw(Box::new(FfiPetClient { inner }))
    })
    .unwrap_or(std::ptr::null_mut())
}

/// Free a client created by `miau_client_new`. Safe to call with null.
#[unsafe(no_mangle)]
pub extern "C" fn miau_client_free(client: *mut FfiPetClient) {
    if client.is_null() {
        return;
    }
    let _ = catch_unwind(|| {
        drop(unsafe { Box::from_raw(client) });
    });
}

// ---------------------------------------------------------------------------
// Build request functions
// ---------------------------------------------------------------------------

#[unsafe(no_mangle)]
pub extern "C" fn miau_build_list_posts(client: *const FfiPetClient) -> *mut FfiBuildResult {
    build_with(client, "miau_build_list_posts", |c| {
        FfiBuildResult::from_core(c.build_list_posts())
    })
}

#[unsafe(no_mangle)]
pub extern "C" fn miau_build_latest_post(client: *const FfiPetClient) -> *mut FfiBuildResult {
    build_with(client, "miau_build_latest_post", |c| {
        FfiBuildResult::from_core(c.build_latest_post())
    })
}

#[unsafe(no_mangle)]
pub extern "C" fn miau_build_get_user(
    client: *const FfiPetClient,
    id: *const c_char,
) -> *mut FfiBuildResult {
    build_with(client, "miau_build_get_user", |c| match read_string(id) {
        Some(id) => FfiBuildResult::from_core(c.build_get_user(&id)),
        None => FfiBuildResult::null_arg("id"),
    })
}

/// Build a user registration request. Empty optional contacts are omitted.
#[unsafe(no_mangle)]
pub extern "C" fn miau_build_create_user(
    client: *const FfiPetClient,
    input: *const FfiNewUser,
) -> *mut FfiBuildResult {
    build_with(client, "miau_build_create_user", |c| {
        if input.is_null() {
            return FfiBuildResult::null_arg("input");
        }
        let input = unsafe { &*input };
        let (Some(apple_id), Some(name), Some(category), Some(zip_code)) = (
            read_string(input.apple_id),
            read_string(input.organization_name),
            read_string(input.organization_category),
            read_string(input.organization_zip_code),
        ) else {
            return FfiBuildResult::null_arg("input field");
        };
        let user = NewUser {
            apple_id,
            avatar: input.avatar,
            organization_name: name,
            organization_category: category,
            organization_zip_code: zip_code,
            email: read_optional(input.email),
            phone: read_optional(input.phone),
            website: read_optional(input.website),
            created_at: Some(Utc::now()),
        };
        FfiBuildResult::from_core(c.build_create_user(&user))
    })
}

/// Build a post creation request. The post starts open.
#[unsafe(no_mangle)]
pub extern "C" fn miau_build_create_post(
    client: *const FfiPetClient,
    input: *const FfiNewPetPost,
) -> *mut FfiBuildResult {
    build_with(client, "miau_build_create_post", |c| {
        if input.is_null() {
            return FfiBuildResult::null_arg("input");
        }
        let input = unsafe { &*input };
        let (Some(user_id), Some(kind), Some(title), Some(name), Some(quantity), Some(category)) = (
            read_string(input.user_id),
            read_string(input.kind),
            read_string(input.title),
            read_string(input.item_name),
            read_string(input.item_quantity),
            read_string(input.item_category),
        ) else {
            return FfiBuildResult::null_arg("input field");
        };
        let expiration_date = match read_optional(input.expiration_date) {
            None => None,
            Some(raw) => match DateTime::parse_from_rfc3339(&raw) {
                Ok(date) => Some(date.with_timezone(&Utc)),
                Err(e) => {
                    return FfiBuildResult::failure(
                        FfiErrorCode::InvalidArg,
                        format!("invalid expiration date {raw:?}: {e}"),
                    )
                }
            },
        };
        let post = NewPetPost {
            user_id,
            kind: PostKind::from(kind),
            title,
            description: read_string(input.description).unwrap_or_default(),
            item: NewItem {
                name,
                quantity,
                category,
                expiration_date,
            },
            status: PostStatus::Open,
        };
        FfiBuildResult::from_core(c.build_create_post(&post))
    })
}

#[unsafe(no_mangle)]
pub extern "C" fn miau_build_authenticate(
    client: *const FfiPetClient,
    apple_id: *const c_char,
) -> *mut FfiBuildResult {
    build_with(client, "miau_build_authenticate", |c| match read_string(apple_id) {
        Some(apple_id) => FfiBuildResult::from_core(c.build_authenticate(&apple_id)),
        None => FfiBuildResult::null_arg("apple_id"),
    })
}

/// Build an authenticated GET for `route`, with `id` appended when non-null.
///
/// Fails with `Unauthenticated` when the client holds no token.
#[unsafe(no_mangle)]
pub extern "C" fn miau_build_get(
    client: *const FfiPetClient,
    route: FfiRoute,
    id: *const c_char,
) -> *mut FfiBuildResult {
    build_with(client, "miau_build_get", |c| {
        let id = read_optional(id);
        FfiBuildResult::from_core(c.build_get(route.into(), id.as_deref()))
    })
}

/// Build a POST to `route`. `json_body` must be a JSON object.
#[unsafe(no_mangle)]
pub extern "C" fn miau_build_post(
    client: *const FfiPetClient,
    route: FfiRoute,
    json_body: *const c_char,
) -> *mut FfiBuildResult {
    build_with(client, "miau_build_post", |c| {
        let Some(raw) = read_string(json_body) else {
            return FfiBuildResult::null_arg("json_body");
        };
        match serde_json::from_str::<RawObject>(&raw) {
            Ok(body) => FfiBuildResult::from_core(c.build_post(route.into(), &body)),
            Err(e) => FfiBuildResult::failure(
                FfiErrorCode::InvalidArg,
                format!("json_body is not a JSON object: {e}"),
            ),
        }
    })
}

#[unsafe(no_mangle)]
pub extern "C" fn miau_build_update_post_status(
    client: *const FfiPetClient,
    id: *const c_char,
    status: FfiPostStatus,
) -> *mut FfiBuildResult {
    build_with(client, "miau_build_update_post_status", |c| match read_string(id) {
        Some(id) => FfiBuildResult::from_core(c.build_update_post_status(&id, status.into())),
        None => FfiBuildResult::null_arg("id"),
    })
}

#[unsafe(no_mangle)]
pub extern "C" fn miau_build_delete_post(
    client: *const FfiPetClient,
    id: *const c_char,
) -> *mut FfiBuildResult {
    build_with(client, "miau_build_delete_post", |c| match read_string(id) {
        Some(id) => FfiBuildResult::from_core(c.build_delete_post(&id)),
        None => FfiBuildResult::null_arg("id"),
    })
}

// ---------------------------------------------------------------------------
// Parse response functions
// ---------------------------------------------------------------------------

/// Returns a result with `data_tag = PetPostList` on success.
#[unsafe(no_mangle)]
pub extern "C" fn miau_parse_list_posts(
    client: *const FfiPetClient,
    response: *const FfiHttpResponse,
) -> *mut FfiPetResult {
    parse_with(
        client,
        response,
        "miau_parse_list_posts",
        PetClient::parse_list_posts,
        FfiPetResult::ok_pet_post_list,
    )
}

/// Returns a result with `data_tag = PetPostAndUser` on success.
#[unsafe(no_mangle)]
pub extern "C" fn miau_parse_latest_post(
    client: *const FfiPetClient,
    response: *const FfiHttpResponse,
) -> *mut FfiPetResult {
    parse_with(
        client,
        response,
        "miau_parse_latest_post",
        PetClient::parse_latest_post,
        FfiPetResult::ok_pet_post_and_user,
    )
}

/// Returns a result with `data_tag = User` on success.
#[unsafe(no_mangle)]
pub extern "C" fn miau_parse_get_user(
    client: *const FfiPetClient,
    response: *const FfiHttpResponse,
) -> *mut FfiPetResult {
    parse_with(
        client,
        response,
        "miau_parse_get_user",
        PetClient::parse_get_user,
        FfiPetResult::ok_user,
    )
}

/// Returns a result with `data_tag = User` on success.
#[unsafe(no_mangle)]
pub extern "C" fn miau_parse_create_user(
    client: *const FfiPetClient,
    response: *const FfiHttpResponse,
) -> *mut FfiPetResult {
    parse_with(
        client,
        response,
        "miau_parse_create_user",
        PetClient::parse_create_user,
        FfiPetResult::ok_user,
    )
}

/// Returns a result with `data_tag = PetPost` on success.
#[unsafe(no_mangle)]
pub extern "C" fn miau_parse_create_post(
    client: *const FfiPetClient,
    response: *const FfiHttpResponse,
) -> *mut FfiPetResult {
    parse_with(
        client,
        response,
        "miau_parse_create_post",
        PetClient::parse_create_post,
        FfiPetResult::ok_pet_post,
    )
}

/// Returns a result with `data_tag = Json` on success; the object carries
/// the `token` to pass to `miau_client_with_token`.
#[unsafe(no_mangle)]
pub extern "C" fn miau_parse_authenticate(
    client: *const FfiPetClient,
    response: *const FfiHttpResponse,
) -> *mut FfiPetResult {
    parse_with(
        client,
        response,
        "miau_parse_authenticate",
        PetClient::parse_authenticate,
        FfiPetResult::ok_json,
    )
}

/// Returns a result with `data_tag = Json` on success.
#[unsafe(no_mangle)]
pub extern "C" fn miau_parse_get(
    client: *const FfiPetClient,
    response: *const FfiHttpResponse,
) -> *mut FfiPetResult {
    parse_with(
        client,
        response,
        "miau_parse_get",
        PetClient::parse_get,
        FfiPetResult::ok_json,
    )
}

/// Returns a result with `data_tag = Json` on success.
#[unsafe(no_mangle)]
pub extern "C" fn miau_parse_post(
    client: *const FfiPetClient,
    response: *const FfiHttpResponse,
) -> *mut FfiPetResult {
    parse_with(
        client,
        response,
        "miau_parse_post",
        PetClient::parse_post,
        FfiPetResult::ok_json,
    )
}

/// Returns a result with `data_tag = PetPost` on success.
#[unsafe(no_mangle)]
pub extern "C" fn miau_parse_update_post_status(
    client: *const FfiPetClient,
    response: *const FfiHttpResponse,
) -> *mut FfiPetResult {
    parse_with(
        client,
        response,
        "miau_parse_update_post_status",
        PetClient::parse_update_post_status,
        FfiPetResult::ok_pet_post,
    )
}

/// Returns a result with `data_tag = Json` on success. A `deletedCount` of 0
/// yields `NothingDeleted`.
#[unsafe(no_mangle)]
pub extern "C" fn miau_parse_delete_post(
    client: *const FfiPetClient,
    response: *const FfiHttpResponse,
) -> *mut FfiPetResult {
    parse_with(
        client,
        response,
        "miau_parse_delete_post",
        PetClient::parse_delete_post,
        FfiPetResult::ok_json,
    )
}

// ---------------------------------------------------------------------------
// Free functions
// ---------------------------------------------------------------------------

/// Free an `FfiBuildResult` and the request it carries. Safe to call with
/// null.
#[unsafe(no_mangle)]
pub extern "C" fn miau_free_build_result(result: *mut FfiBuildResult) {
    if result.is_null() {
        return;
    }
    let _ = catch_unwind(|| unsafe { FfiBuildResult::free(result) });
}

/// Free an `FfiPetResult` returned by any `miau_parse_*` function.
/// Safe to call with null. Uses `data_tag` to determine what `data` points to.
#[unsafe(no_mangle)]
pub extern "C" fn miau_free_result(result: *mut FfiPetResult) {
    if result.is_null() {
        return;
    }
    let _ = catch_unwind(|| unsafe { FfiPetResult::free(result) });
}

/// Free a C string allocated by this library. Safe to call with null.
#[unsafe(no_mangle)]
pub extern "C" fn miau_free_string(s: *mut c_char) {
    if !s.is_null() {
        let _ = catch_unwind(|| free_c_string(s));
    }
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
