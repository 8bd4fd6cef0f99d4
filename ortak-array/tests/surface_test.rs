//! Combinator surface over the array core.

use ortak::{OrtakError, Value};
use ortak_array::{ArrayOptions, ShareableArray};

fn ints(items: impl IntoIterator<Item = i32>) -> ShareableArray {
    ShareableArray::with_items(
        ArrayOptions::default(),
        items.into_iter().map(|i| Some(Value::Int(i))),
    )
    .unwrap()
}

#[test]
fn test_slice_and_concat() {
    let array = ints(0..6);
    assert_eq!(
        array.slice(1, 4).unwrap(),
        vec![Some(Value::Int(1)), Some(Value::Int(2)), Some(Value::Int(3))]
    );
    assert_eq!(array.slice(4, 99).unwrap().len(), 2);
    assert_eq!(array.slice(9, 12).unwrap(), vec![]);

    let other = ints(10..12);
    let combined = array.concat(&other).unwrap();
    assert_eq!(combined.len(), 8);
    assert_eq!(combined[6], Some(Value::Int(10)));
}

#[test]
fn test_to_reversed_and_to_sorted_leave_original_alone() {
    let array = ints([3, 1, 2]);
    assert_eq!(
        array.to_reversed().unwrap(),
        [2, 1, 3].map(|i| Some(Value::Int(i))).to_vec()
    );
    assert_eq!(
        array.to_sorted().unwrap(),
        [1, 2, 3].map(|i| Some(Value::Int(i))).to_vec()
    );
    assert_eq!(
        array.to_vec().unwrap(),
        [3, 1, 2].map(|i| Some(Value::Int(i))).to_vec()
    );
}

#[test]
fn test_includes_and_index_of() {
    let array = ints([5, 7, 5]);
    assert!(array.includes(Value::Int(7)).unwrap());
    assert!(!array.includes(Value::Int(9)).unwrap());
    assert_eq!(array.index_of(Value::Int(5)).unwrap(), Some(0));
    assert_eq!(array.last_index_of(Value::Int(5)).unwrap(), Some(2));
    assert_eq!(array.index_of(Value::Int(9)).unwrap(), None);

    let mut with_hole = ints([1]);
    with_hole.push(None).unwrap();
    assert!(with_hole.includes(None).unwrap());
}

#[test]
fn test_find_family() {
    let array = ints([4, 8, 15, 16, 23]);

    let found = array
        .find(|item, _| matches!(item, Some(Value::Int(n)) if *n > 10))
        .unwrap();
    assert_eq!(found, Some(Value::Int(15)));

    assert_eq!(
        array
            .find_index(|item, _| matches!(item, Some(Value::Int(n)) if *n > 10))
            .unwrap(),
        Some(2)
    );
    assert_eq!(
        array
            .find_last(|item, _| matches!(item, Some(Value::Int(n)) if *n % 2 == 0))
            .unwrap(),
        Some(Value::Int(16))
    );
    assert_eq!(
        array
            .find_last_index(|item, _| matches!(item, Some(Value::Int(n)) if *n % 2 == 0))
            .unwrap(),
        Some(3)
    );
    assert_eq!(array.find(|_, _| false).unwrap(), None);
}

#[test]
fn test_every_and_some() {
    let array = ints([2, 4, 6]);
    assert!(array
        .every(|item, _| matches!(item, Some(Value::Int(n)) if *n % 2 == 0))
        .unwrap());
    assert!(!array
        .every(|item, _| matches!(item, Some(Value::Int(n)) if *n > 2))
        .unwrap());
    assert!(array
        .some(|item, _| matches!(item, Some(Value::Int(n)) if *n == 4))
        .unwrap());
    assert!(!array.some(|_, _| false).unwrap());
}

#[test]
fn test_filter_map_flat_map() {
    let array = ints(0..5);

    let odd = array
        .filter(|item, _| matches!(item, Some(Value::Int(n)) if *n % 2 == 1))
        .unwrap();
    assert_eq!(odd, [1, 3].map(|i| Some(Value::Int(i))).to_vec());

    let doubled = array
        .map_items(|item, _| item.as_ref().map(|v| Value::Int(v.as_int().unwrap() * 2)))
        .unwrap();
    assert_eq!(doubled, [0, 2, 4, 6, 8].map(|i| Some(Value::Int(i))).to_vec());

    let pairs = array
        .flat_map(|item, index| vec![Some(Value::Int(index as i32)), item.clone()])
        .unwrap();
    assert_eq!(pairs.len(), 10);
    assert_eq!(pairs[1], Some(Value::Int(0)));
}

#[test]
fn test_fold_and_reduce() {
    let array = ints([1, 2, 3, 4]);

    let sum = array
        .fold(0i64, |acc, item, _| {
            acc + item.as_ref().and_then(Value::as_int).unwrap_or(0) as i64
        })
        .unwrap();
    assert_eq!(sum, 10);

    let reduced = array
        .reduce(|acc, item, _| {
            let a = acc.as_ref().and_then(Value::as_int).unwrap_or(0);
            let b = item.as_ref().and_then(Value::as_int).unwrap_or(0);
            Some(Value::Int(a + b))
        })
        .unwrap();
    assert_eq!(reduced, Some(Value::Int(10)));

    let right = array
        .reduce_right(|acc, item, _| {
            let a = acc.as_ref().and_then(Value::as_int).unwrap_or(0);
            let b = item.as_ref().and_then(Value::as_int).unwrap_or(0);
            Some(Value::Int(a * 10 + b))
        })
        .unwrap();
    assert_eq!(right, Some(Value::Int(4_321)));

    let concatenated = array
        .fold_right(String::new(), |mut acc, item, _| {
            acc.push_str(&item.as_ref().unwrap().to_string());
            acc
        })
        .unwrap();
    assert_eq!(concatenated, "4321");
}

#[test]
fn test_reduce_of_empty_is_typed_error() {
    let array = ints([]);
    let err = array.reduce(|acc, _, _| acc).unwrap_err();
    assert!(matches!(err, OrtakError::EmptyReduce));
    let err = array.reduce_right(|acc, _, _| acc).unwrap_err();
    assert!(matches!(err, OrtakError::EmptyReduce));

    // With an explicit initial value the fold succeeds.
    assert_eq!(array.fold(7, |acc, _, _| acc).unwrap(), 7);
}

#[test]
fn test_join() {
    let mut array = ints([1, 2]);
    array.push(None).unwrap();
    array.push(Value::from("x")).unwrap();
    assert_eq!(array.join(",").unwrap(), "1,2,,x");
    assert_eq!(array.join(" - ").unwrap(), "1 - 2 -  - x");
    assert_eq!(ints([]).join(",").unwrap(), "");
}

#[test]
fn test_for_each_visits_in_order() {
    let array = ints([10, 20, 30]);
    let mut seen = Vec::new();
    array
        .for_each(|item, index| {
            seen.push((index, item.as_ref().and_then(Value::as_int).unwrap()));
        })
        .unwrap();
    assert_eq!(seen, [(0, 10), (1, 20), (2, 30)]);
}
