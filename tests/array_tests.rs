use ecmascript::evaluate_script;

#[ctor::ctor]
fn __init_test_logger() {
    let _ = env_logger::Builder::from_env(env_logger::Env::default()).is_test(true).try_init();
}

fn eval(script: &str) -> String {
    evaluate_script(script, None::<&std::path::Path>).unwrap()
}

#[test]
fn literals_holes_and_trailing_commas() {
    assert_eq!(eval("[1, , 3,].length"), "3");
    assert_eq!(eval("var a = [1, , 3]; [1 in a, a[1]].join()"), "false,");
    assert_eq!(eval("[...'ab', ...[1, 2]].join()"), "a,b,1,2");
}

#[test]
fn length_tracks_indices_and_truncates() {
    assert_eq!(eval("var a = []; a[5] = 1; a.length"), "6");
    assert_eq!(eval("var a = [1, 2, 3, 4]; a.length = 2; [a.join(), a[3]].join('|')"), "1,2|");
    assert_eq!(eval("try { [].length = -1; } catch (e) { e instanceof RangeError }"), "true");
}

#[test]
fn length_assignment_converts_objects_to_numbers() {
    assert_eq!(eval("var a = [1, 2, 3, 4]; a.length = new Number(2); a.join()"), "1,2");
    assert_eq!(eval("var a = [1, 2, 3]; a.length = { valueOf: function () { return 1; } }; a.join()"), "1");
    assert_eq!(eval("var a = [1, 2, 3]; a.length = new String('0'); a.length"), "0");
    assert_eq!(eval("var calls = 0; var a = [1, 2]; a.length = { valueOf: function () { calls++; return 2; } }; calls"), "2");
    assert_eq!(eval("var a = [1, 2, 3]; Object.defineProperty(a, 'length', { value: { valueOf: function () { return 1; } } }); a.join()"), "1");
    assert_eq!(eval("try { [].length = { valueOf: function () { return 1.5; } }; } catch (e) { e instanceof RangeError }"), "true");
}

#[test]
fn array_constructor_forms() {
    assert_eq!(eval("[new Array(3).length, Array(1, 2).join(), new Array('3').length, Array.isArray(Array(2))].join()"), "3,1,2,1,true");
    assert_eq!(eval("Array.of(7).length + Array.from('abc').join('')"), "1abc");
    assert_eq!(eval("Array.from({ length: 3 }, function (v, i) { return i * 2; }).join()"), "0,2,4");
}

#[test]
fn stack_and_queue_methods() {
    assert_eq!(eval("var a = [1, 2]; var n = a.push(3, 4); var p = a.pop(); var s = a.shift(); a.unshift(0); [n, p, s, a.join()].join('|')"), "4|4|1|0,2,3");
    assert_eq!(eval("[].pop() === undefined && [].shift() === undefined"), "true");
}

#[test]
fn slice_splice_concat() {
    assert_eq!(eval("[1, 2, 3, 4, 5].slice(1, -1).join()"), "2,3,4");
    assert_eq!(eval("var a = [1, 2, 3, 4]; var r = a.splice(1, 2, 'x', 'y', 'z'); [r.join(), a.join()].join('|')"), "2,3|1,x,y,z,4");
    assert_eq!(eval("[1].concat([2, [3]], 4).length"), "4");
}

#[test]
fn search_methods() {
    assert_eq!(eval("var a = [1, 2, NaN, 2]; [a.indexOf(2), a.lastIndexOf(2), a.indexOf(NaN), a.includes(NaN), a.indexOf(9)].join()"), "1,3,-1,true,-1");
    assert_eq!(eval("[5, 12, 8].find(function (x) { return x > 6; }) + ':' + [5, 12, 8].findIndex(function (x) { return x > 100; })"), "12:-1");
}

#[test]
fn iteration_methods() {
    let script = r#"
        var a = [1, 2, 3, 4];
        [
            a.map(function (x) { return x * x; }).join(' '),
            a.filter(function (x) { return x % 2; }).join(' '),
            a.reduce(function (s, x) { return s + x; }),
            a.reduceRight(function (s, x) { return s + x; }, ''),
            a.every(function (x) { return x > 0; }),
            a.some(function (x) { return x > 3; })
        ].join('|')
    "#;
    assert_eq!(eval(script), "1 4 9 16|1 3|10|4321|true|true");
}

#[test]
fn reduce_of_empty_array_without_initial_value_throws() {
    assert_eq!(eval("try { [].reduce(function () {}); } catch (e) { e instanceof TypeError }"), "true");
}

#[test]
fn for_each_skips_holes_and_passes_index() {
    assert_eq!(eval("var out = []; [1, , 3].forEach(function (v, i, arr) { out.push(i + '=' + v); }); out.join()"), "0=1,2=3");
}

#[test]
fn sort_default_and_comparator() {
    assert_eq!(eval("[10, 9, 1, 100].sort().join()"), "1,10,100,9");
    assert_eq!(eval("[10, 9, 1, 100].sort(function (a, b) { return a - b; }).join()"), "1,9,10,100");
    assert_eq!(eval("[3, undefined, 1].sort().length"), "3");
    let stable = r#"
        var items = [{ k: 1, v: 'a' }, { k: 0, v: 'b' }, { k: 1, v: 'c' }, { k: 0, v: 'd' }];
        items.sort(function (x, y) { return x.k - y.k; }).map(function (i) { return i.v; }).join('')
    "#;
    assert_eq!(eval(stable), "bdac");
}

#[test]
fn reverse_fill_join() {
    assert_eq!(eval("[1, 2, 3].reverse().join('-')"), "3-2-1");
    assert_eq!(eval("new Array(3).fill(0).join()"), "0,0,0");
    assert_eq!(eval("[null, undefined, 1].join()"), ",,1");
}

#[test]
fn to_string_handles_cycles() {
    assert_eq!(eval("var a = [1]; a.push(a); String(a)"), "1,");
}

#[test]
fn generic_methods_on_array_likes() {
    assert_eq!(eval("var o = { length: 2, 0: 'a', 1: 'b' }; Array.prototype.join.call(o, '+')"), "a+b");
    assert_eq!(eval("Array.prototype.map.call('abc', function (c) { return c.toUpperCase(); }).join('')"), "ABC");
}
