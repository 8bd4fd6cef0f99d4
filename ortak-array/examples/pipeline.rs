//! Example walking the array surface: build, transform, hand off.

use ortak::Value;
use ortak_array::{ArrayOptions, ShareableArray};

fn main() {
    let mut array = ShareableArray::new(ArrayOptions::default()).unwrap();

    for word in ["delta", "alpha", "charlie", "bravo"] {
        array.push(Value::from(word)).unwrap();
    }
    array.push(None).unwrap();
    println!("raw:      {}", array.join(", ").unwrap());

    array.sort().unwrap();
    println!("sorted:   {}", array.join(", ").unwrap());

    let shouted = array
        .map_items(|item, _| {
            item.as_ref()
                .and_then(Value::as_str)
                .map(|s| Value::from(s.to_uppercase()))
        })
        .unwrap();
    println!(
        "shouted:  {}",
        shouted
            .iter()
            .map(|item| item
                .as_ref()
                .map(|v| v.to_string())
                .unwrap_or_default())
            .collect::<Vec<_>>()
            .join(", ")
    );

    // Hand the array to another context without copying a byte.
    let view = ShareableArray::from_transferable_state(
        array.to_transferable_state(),
        ArrayOptions::default(),
    )
    .unwrap();
    println!("view sees {} elements", view.len());

    let stats = array.stats();
    println!(
        "{} live bytes in a {}-byte data region",
        stats.used_space, stats.data_capacity
    );
}
