use crate::sys;

#[test]
fn test_malloc_free() {
    let ptr = sys::malloc(1024);
    assert!(!ptr.is_null());
    assert!((ptr as usize).is_multiple_of(8));
    unsafe {
        ptr.write_bytes(0xAB, 1024);
        assert_eq!(*ptr, 0xAB);
        assert_eq!(*ptr.add(1023), 0xAB);
        sys::free(ptr);
    }
}

#[test]
fn test_malloc_zero_size() {
    let a = sys::malloc(0);
    let b = sys::malloc(0);
    assert!(!a.is_null());
    assert!(!b.is_null());
    assert_ne!(a, b, "zero-size blocks must be distinct");
    unsafe {
        sys::free(a);
        sys::free(b);
    }
}

#[test]
fn test_multiple_allocations() {
    let sizes = [1, 7, 64, 4096, 1024 * 1024 + 3];
    let blocks = sizes
        .iter()
        .map(|&size| {
            let ptr = sys::malloc(size);
            assert!(!ptr.is_null());
            unsafe { ptr.write_bytes(size as u8, size) };
            (ptr, size)
        })
        .collect::<Vec<_>>();

    for &(ptr, size) in &blocks {
        let bytes = unsafe { std::slice::from_raw_parts(ptr, size) };
        assert!(bytes.iter().all(|&b| b == size as u8));
    }

    for (ptr, _) in blocks {
        unsafe { sys::free(ptr) };
    }
}

#[test]
fn test_page_size() {
    let page_size = sys::get_page_size();
    assert!(page_size > 0);
    assert!(page_size.is_power_of_two());
    assert_eq!(page_size, sys::get_page_size());
}
